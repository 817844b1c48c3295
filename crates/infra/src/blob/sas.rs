//! Shared-access-signature URLs for stored images.
//!
//! A URL grants read access to one image for a fixed window:
//! `{base}/images/{name}?sp=r&st={start}&se={expiry}&sig={hex hmac}`.
//! The HMAC-SHA256 covers `"{sp}\n{st}\n{se}\n/images/{name}"`.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use ring::hmac;
use serde::Deserialize;

const PERMISSION_READ: &str = "r";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const WINDOW_HOURS: i64 = 24;

/// Query parameters of a signed image URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SasQuery {
    pub sp: Option<String>,
    pub st: Option<String>,
    pub se: Option<String>,
    pub sig: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SasError {
    #[error("missing signature parameter")]
    Missing,

    #[error("malformed signature parameter")]
    Malformed,

    #[error("signature mismatch")]
    BadSignature,

    #[error("signature outside its validity window")]
    Expired,
}

#[derive(Clone)]
pub struct SasSigner {
    key: hmac::Key,
    public_base: String,
}

impl core::fmt::Debug for SasSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SasSigner")
            .field("public_base", &self.public_base)
            .finish_non_exhaustive()
    }
}

impl SasSigner {
    pub fn new(signing_key: &[u8], public_base: impl Into<String>) -> Self {
        let public_base = public_base.into().trim_end_matches('/').to_string();
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, signing_key),
            public_base,
        }
    }

    fn string_to_sign(permission: &str, start: &str, expiry: &str, name: &str) -> String {
        format!("{permission}\n{start}\n{expiry}\n/images/{name}")
    }

    /// Read-only URL for `name`, valid from a day before `now` to a day after.
    pub fn url(&self, name: &str, now: DateTime<Utc>) -> String {
        let start = (now - Duration::hours(WINDOW_HOURS)).format(TIME_FORMAT).to_string();
        let expiry = (now + Duration::hours(WINDOW_HOURS)).format(TIME_FORMAT).to_string();
        let payload = Self::string_to_sign(PERMISSION_READ, &start, &expiry, name);
        let sig = hex::encode(hmac::sign(&self.key, payload.as_bytes()).as_ref());
        format!(
            "{}/images/{}?sp={}&st={}&se={}&sig={}",
            self.public_base, name, PERMISSION_READ, start, expiry, sig
        )
    }

    /// Check a presented signature for `name` at `now`.
    pub fn verify(&self, name: &str, query: &SasQuery, now: DateTime<Utc>) -> Result<(), SasError> {
        let (Some(sp), Some(st), Some(se), Some(sig)) = (&query.sp, &query.st, &query.se, &query.sig)
        else {
            return Err(SasError::Missing);
        };
        if sp != PERMISSION_READ {
            return Err(SasError::Malformed);
        }
        let start = parse_time(st)?;
        let expiry = parse_time(se)?;
        let tag = hex::decode(sig).map_err(|_| SasError::Malformed)?;

        let payload = Self::string_to_sign(sp, st, se, name);
        hmac::verify(&self.key, payload.as_bytes(), &tag).map_err(|_| SasError::BadSignature)?;

        if now < start || now > expiry {
            return Err(SasError::Expired);
        }
        Ok(())
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, SasError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| SasError::Malformed)
}
