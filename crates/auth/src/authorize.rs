use thiserror::Error;

use skillsgarden_core::UserId;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The principal's role is not in the allowed set.
    #[error("forbidden: role '{0}' has no permission")]
    RoleNotAllowed(Role),

    /// The principal acted on another user's resource without being admin.
    #[error("forbidden: not the owner")]
    NotOwner,

    /// A non-admin attempted to assign a type other than `User`.
    #[error("forbidden: cannot assign role '{0}'")]
    CannotAssignRole(Role),
}

/// Authorize a principal against a set of allowed roles.
///
/// - No IO
/// - No panics
pub fn authorize_roles(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role()) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed(principal.role()))
    }
}

/// The principal must be `owner` or an admin.
pub fn authorize_self_or_admin(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.is_admin() || principal.is_self(owner) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// The principal must be `owner` itself (admins included).
pub fn authorize_self(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.is_self(owner) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Only admins may set an account type other than `User`.
pub fn authorize_role_assignment(actor: Option<&Principal>, requested: Option<Role>) -> Result<(), AuthzError> {
    match requested {
        None | Some(Role::User) => Ok(()),
        Some(_) if actor.is_some_and(Principal::is_admin) => Ok(()),
        Some(role) => Err(AuthzError::CannotAssignRole(role)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: i32, role: Role) -> Principal {
        Principal::new(UserId::new(id), role)
    }

    #[test]
    fn role_sets() {
        assert!(authorize_roles(&p(1, Role::Admin), &[Role::Admin]).is_ok());
        assert!(authorize_roles(&p(1, Role::Organiser), &[Role::Admin, Role::Organiser]).is_ok());
        assert_eq!(
            authorize_roles(&p(1, Role::User), &[Role::Admin]),
            Err(AuthzError::RoleNotAllowed(Role::User))
        );
    }

    #[test]
    fn ownership() {
        assert!(authorize_self_or_admin(&p(1, Role::User), UserId::new(1)).is_ok());
        assert!(authorize_self_or_admin(&p(9, Role::Admin), UserId::new(1)).is_ok());
        assert!(authorize_self_or_admin(&p(2, Role::Organiser), UserId::new(1)).is_err());

        assert!(authorize_self(&p(9, Role::Admin), UserId::new(1)).is_err());
        assert!(authorize_self(&p(1, Role::User), UserId::new(1)).is_ok());
    }

    #[test]
    fn only_admins_escalate() {
        let admin = p(1, Role::Admin);
        let user = p(2, Role::User);
        assert!(authorize_role_assignment(None, None).is_ok());
        assert!(authorize_role_assignment(None, Some(Role::User)).is_ok());
        assert!(authorize_role_assignment(None, Some(Role::Admin)).is_err());
        assert!(authorize_role_assignment(Some(&user), Some(Role::Organiser)).is_err());
        assert!(authorize_role_assignment(Some(&admin), Some(Role::Admin)).is_ok());
    }
}
