use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skillsgarden_core::UserId;

use crate::Role;

/// JWT claims model.
///
/// Field names follow the short JWT claim names (`role`, `nameid`) plus the
/// registered claims. Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Account type of the subject.
    pub role: Role,

    /// Subject user id, as a decimal string.
    pub nameid: String,

    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<UserId, TokenValidationError> {
        self.nameid
            .parse()
            .map_err(|_| TokenValidationError::InvalidSubject)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window (exp <= nbf)")]
    InvalidTimeWindow,

    #[error("token subject is not a user id")]
    InvalidSubject,
}

/// Deterministically validate the lifetime claims against `now`.
///
/// Signature, issuer and audience are checked while decoding; this only covers
/// the time window so callers can pin the clock.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.nbf {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.nbf {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(nbf: DateTime<Utc>, exp: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            role: Role::User,
            nameid: "12".into(),
            iss: "i".into(),
            aud: "a".into(),
            iat: nbf.timestamp(),
            nbf: nbf.timestamp(),
            exp: exp.timestamp(),
        }
    }

    #[test]
    fn window_is_enforced() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), now + Duration::minutes(59));
        assert_eq!(validate_claims(&c, now), Ok(()));
        assert_eq!(
            validate_claims(&c, now + Duration::hours(2)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, now - Duration::hours(1)),
            Err(TokenValidationError::NotYetValid)
        );
        let bad = claims(now, now);
        assert_eq!(validate_claims(&bad, now), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn subject_parses_to_user_id() {
        let now = Utc::now();
        let mut c = claims(now, now + Duration::hours(1));
        assert_eq!(c.user_id().unwrap().get(), 12);
        c.nameid = "abc".into();
        assert_eq!(c.user_id(), Err(TokenValidationError::InvalidSubject));
    }
}
