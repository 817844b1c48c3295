use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;

use super::{BlobError, BlobStore, ImageUpload, SasSigner, blob_name, check_name};

/// Blob store backed by a flat directory on disk.
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    signer: SasSigner,
}

impl LocalBlobStore {
    /// Create the directory if needed.
    pub async fn open(root: impl AsRef<Path>, signer: SasSigner) -> Result<Self, BlobError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await.map_err(|source| BlobError::Io {
            name: root.display().to_string(),
            source,
        })?;
        Ok(Self { root, signer })
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, BlobError> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

fn io_error(name: &str) -> impl FnOnce(std::io::Error) -> BlobError + '_ {
    move |source| BlobError::Io {
        name: name.to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()), err)]
    async fn save_image(&self, upload: ImageUpload) -> Result<String, BlobError> {
        let name = blob_name(&upload.file_name)?;
        let path = self.path_of(&name)?;
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(io_error(&name))?;
        Ok(name)
    }

    #[instrument(skip(self), err)]
    async fn delete_image(&self, name: &str) -> Result<bool, BlobError> {
        let path = self.path_of(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(name)(e)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, BlobError> {
        let path = self.path_of(name)?;
        tokio::fs::try_exists(&path).await.map_err(io_error(name))
    }

    async fn read(&self, name: &str) -> Result<Option<Bytes>, BlobError> {
        let path = self.path_of(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(name)(e)),
        }
    }

    fn signer(&self) -> &SasSigner {
        &self.signer
    }
}
