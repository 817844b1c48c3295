//! HS256 token issuing and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use skillsgarden_core::UserId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};
use crate::{Principal, Role};

/// Lifetime of an issued token, in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed or unsigned token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Validates bearer tokens and resolves them to claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Token issuer/audience/key settings.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub audience: String,
    pub key: String,
}

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 tokens carrying `role` + `nameid`.
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    audience: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Self {
        let secret = settings.key.as_bytes();
        Self {
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + Duration::seconds(TOKEN_LIFETIME_SECS);
        let claims = JwtClaims {
            role,
            nameid: user_id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { value, expires_at })
    }

    /// Validate a token and resolve the principal it names.
    pub fn principal(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let claims = self.validate(token, now)?;
        Ok(Principal::new(claims.user_id()?, claims.role))
    }
}

impl JwtValidator for TokenService {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);

        let claims = decode::<JwtClaims>(token, &self.decoding, &validation)?.claims;
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(key: &str) -> TokenService {
        TokenService::new(&TokenSettings {
            issuer: "DebugIssuer".into(),
            audience: "DebugAudience".into(),
            key: key.into(),
        })
    }

    #[test]
    fn issued_token_validates_to_principal() {
        let svc = service("DebugKey DebugKey");
        let now = Utc::now();
        let token = svc.issue(UserId::new(5), Role::Organiser, now).unwrap();
        assert_eq!(token.expires_at, now + Duration::hours(1));

        let principal = svc.principal(&token.value, now).unwrap();
        assert_eq!(principal.user_id(), UserId::new(5));
        assert_eq!(principal.role(), Role::Organiser);
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service("k");
        let issued_at = Utc::now() - Duration::hours(2);
        let token = svc.issue(UserId::new(1), Role::User, issued_at).unwrap();
        let err = svc.validate(&token.value, Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Claims(TokenValidationError::Expired)));
    }

    #[test]
    fn foreign_key_or_issuer_is_rejected() {
        let now = Utc::now();
        let token = service("one").issue(UserId::new(1), Role::Admin, now).unwrap();
        assert!(matches!(
            service("two").validate(&token.value, now),
            Err(TokenError::Decode(_))
        ));

        let other = TokenService::new(&TokenSettings {
            issuer: "Elsewhere".into(),
            audience: "DebugAudience".into(),
            key: "one".into(),
        });
        assert!(other.validate(&token.value, now).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service("k").validate("not-a-token", Utc::now()).is_err());
    }
}
