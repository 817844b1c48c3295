//! Process configuration, read once at start-up from the environment.
//!
//! `.env` loading is left to the binary; this module only sees variables.

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use skillsgarden_auth::TokenSettings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
pub const DEV_JWT_ISSUER: &str = "DebugIssuer";
pub const DEV_JWT_AUDIENCE: &str = "DebugAudience";
pub const DEV_JWT_KEY: &str = "DebugKey DebugKey";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got '{value}'")]
    NotANumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobConfig {
    /// Directory for the filesystem store; `None` keeps blobs in memory.
    pub storage_path: Option<PathBuf>,
    pub public_url: String,
    pub signing_key: String,
}

/// Credentials of the admin account created at start-up when missing.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: TokenSettings,
    pub blob: BlobConfig,
    pub admin: Option<AdminSeed>,
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    /// In-memory everything with the development JWT settings.
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            jwt: TokenSettings {
                issuer: DEV_JWT_ISSUER.to_string(),
                audience: DEV_JWT_AUDIENCE.to_string(),
                key: DEV_JWT_KEY.to_string(),
            },
            blob: BlobConfig {
                storage_path: None,
                public_url: DEFAULT_PUBLIC_URL.to_string(),
                signing_key: DEV_JWT_KEY.to_string(),
            },
            admin: None,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            warn!("DATABASE_URL not set; using the in-memory store");
        }

        let jwt = match (get("JWT_ISSUER"), get("JWT_AUDIENCE"), get("JWT_KEY")) {
            (Some(issuer), Some(audience), Some(key)) => TokenSettings { issuer, audience, key },
            (issuer, audience, key) => {
                warn!("JWT settings incomplete; falling back to insecure development values");
                TokenSettings {
                    issuer: issuer.unwrap_or(defaults.jwt.issuer),
                    audience: audience.unwrap_or(defaults.jwt.audience),
                    key: key.unwrap_or(defaults.jwt.key),
                }
            }
        };

        let blob = BlobConfig {
            storage_path: get("BLOB_STORAGE_PATH").map(PathBuf::from),
            public_url: get("BLOB_PUBLIC_URL").unwrap_or(defaults.blob.public_url),
            signing_key: get("BLOB_SIGNING_KEY").unwrap_or_else(|| jwt.key.clone()),
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url,
            db_max_connections: parse_number(&get, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.db_max_connections),
            jwt,
            blob,
            admin,
            bcrypt_cost: parse_number(&get, "BCRYPT_COST")?.unwrap_or(defaults.bcrypt_cost),
        })
    }
}

fn parse_number(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u32>, ConfigError> {
    get(var)
        .map(|value| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::NotANumber { var, value })
        })
        .transpose()
}
