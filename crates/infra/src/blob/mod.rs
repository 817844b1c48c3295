//! Image blob storage.
//!
//! Images are stored under a generated `<uuid><ext>` name; callers persist that
//! name and resolve it to a signed URL when building responses.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use skillsgarden_core::validation::image_extension;

pub mod local;
pub mod memory;
pub mod sas;

pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;
pub use sas::{SasError, SasQuery, SasSigner};

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("unsupported image file name: {0}")]
    UnsupportedType(String),

    #[error("invalid blob name: {0}")]
    InvalidName(String),

    #[error("blob io error for {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("blob store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `upload` and return the generated blob name.
    async fn save_image(&self, upload: ImageUpload) -> Result<String, BlobError>;

    /// Remove a blob; `false` when it did not exist.
    async fn delete_image(&self, name: &str) -> Result<bool, BlobError>;

    async fn exists(&self, name: &str) -> Result<bool, BlobError>;

    async fn read(&self, name: &str) -> Result<Option<Bytes>, BlobError>;

    fn signer(&self) -> &SasSigner;

    fn sas_url(&self, name: &str, now: DateTime<Utc>) -> String {
        self.signer().url(name, now)
    }
}

/// `<uuid v4><lowercased extension>` for an uploaded file name.
pub fn blob_name(file_name: &str) -> Result<String, BlobError> {
    let ext = image_extension(file_name)
        .ok_or_else(|| BlobError::UnsupportedType(file_name.to_string()))?;
    Ok(format!("{}{}", uuid::Uuid::new_v4(), ext))
}

/// Blob names are flat: no separators, no parent references.
pub(crate) fn check_name(name: &str) -> Result<(), BlobError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(BlobError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_keep_a_normalised_extension() {
        let name = blob_name("Holiday.JPG").unwrap();
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 36 + 4);
        assert_ne!(name, blob_name("Holiday.JPG").unwrap());
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        assert!(matches!(blob_name("script.sh"), Err(BlobError::UnsupportedType(_))));
    }

    #[test]
    fn traversal_names_are_rejected() {
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("a/b.png").is_err());
        assert!(check_name("").is_err());
        assert!(check_name("0b4e.png").is_ok());
    }
}
