//! Infrastructure layer: persistence, blob storage, configuration.

pub mod blob;
pub mod config;
pub mod repository;

pub use blob::{
    BlobError, BlobStore, ImageUpload, InMemoryBlobStore, LocalBlobStore, SasError, SasQuery, SasSigner,
};
pub use config::{AdminSeed, AppConfig, BlobConfig, ConfigError};
pub use repository::{
    InMemoryStore, PgStore, RegisterOutcome, Repositories, Repository, StoreError, StoreResult,
};
