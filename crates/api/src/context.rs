use skillsgarden_auth::{Principal, Role};
use skillsgarden_core::UserId;

/// Principal context for a request (authenticated user + role).
///
/// Extracting it from a handler makes the route require a valid bearer token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id()
    }

    pub fn role(&self) -> Role {
        self.principal.role()
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }
}

/// What the auth middleware learned about the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Authentication {
    Anonymous,
    Invalid,
    Authenticated(PrincipalContext),
}
