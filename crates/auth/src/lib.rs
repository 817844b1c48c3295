//! `skillsgarden-auth`: authentication/authorization boundary.
//!
//! Token issuing/validation, password hashing, roles and the user account
//! model. Decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{
    AuthzError, authorize_role_assignment, authorize_roles, authorize_self, authorize_self_or_admin,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHasher};
pub use principal::Principal;
pub use roles::{Role, UnknownVariant};
pub use token::{IssuedToken, JwtValidator, TokenError, TokenService, TokenSettings};
pub use user::{Gender, NewUser, User, UserFields, UserPatch, normalize_email};
