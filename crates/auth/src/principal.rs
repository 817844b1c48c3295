use skillsgarden_core::UserId;

use crate::Role;

/// Authenticated identity: who is calling and with which account type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_self(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
