//! API-side authorization guards.
//!
//! Thin wrappers over the `skillsgarden-auth` checks that pick the error code
//! each route reports when the check fails.

use skillsgarden_auth::{Role, authorize_role_assignment, authorize_roles, authorize_self, authorize_self_or_admin};
use skillsgarden_core::UserId;

use crate::app::errors::{ApiError, ErrorCode};
use crate::context::PrincipalContext;

pub fn require_admin(principal: &PrincipalContext) -> Result<(), ApiError> {
    require_any(principal, &[Role::Admin])
}

pub fn require_any(principal: &PrincipalContext, roles: &[Role]) -> Result<(), ApiError> {
    authorize_roles(principal.principal(), roles).map_err(|_| ErrorCode::RoleNoPermissions.into())
}

/// Admins pass; everyone else only for their own `owner` id.
pub fn require_self_or_admin(
    principal: &PrincipalContext,
    owner: UserId,
    denied: ErrorCode,
) -> Result<(), ApiError> {
    authorize_self_or_admin(principal.principal(), owner).map_err(|_| denied.into())
}

/// Only the owner passes, admins included.
pub fn require_self(principal: &PrincipalContext, owner: UserId, denied: ErrorCode) -> Result<(), ApiError> {
    authorize_self(principal.principal(), owner).map_err(|_| denied.into())
}

/// Non-admins may only create or keep plain `User` accounts.
pub fn require_role_assignment(
    principal: Option<&PrincipalContext>,
    requested: Option<Role>,
) -> Result<(), ApiError> {
    authorize_role_assignment(principal.map(PrincipalContext::principal), requested)
        .map_err(|_| ErrorCode::UnauthorizedToSetUserType.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use skillsgarden_auth::Principal;

    fn ctx(id: i32, role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal::new(UserId::new(id), role))
    }

    #[test]
    fn admin_guard() {
        assert!(require_admin(&ctx(1, Role::Admin)).is_ok());
        let err = require_admin(&ctx(1, Role::Organiser)).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, 4013);
    }

    #[test]
    fn self_or_admin_reports_route_code() {
        let me = ctx(7, Role::User);
        assert!(require_self_or_admin(&me, UserId::new(7), ErrorCode::CanOnlyViewOwnAccount).is_ok());
        let err = require_self_or_admin(&me, UserId::new(8), ErrorCode::CanOnlyViewOwnAccount).unwrap_err();
        assert_eq!(err.code, 4004);
        assert!(require_self_or_admin(&ctx(1, Role::Admin), UserId::new(8), ErrorCode::CanOnlyViewOwnAccount).is_ok());
    }

    #[test]
    fn self_guard_ignores_admin_role() {
        let err = require_self(&ctx(1, Role::Admin), UserId::new(2), ErrorCode::GetOnlyLogYourself).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, 40019);
    }

    #[test]
    fn role_assignment() {
        assert!(require_role_assignment(None, None).is_ok());
        assert!(require_role_assignment(None, Some(Role::User)).is_ok());
        assert_eq!(require_role_assignment(None, Some(Role::Admin)).unwrap_err().code, 4015);
        let admin = ctx(1, Role::Admin);
        assert!(require_role_assignment(Some(&admin), Some(Role::Organiser)).is_ok());
    }
}
