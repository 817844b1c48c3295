use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{BlobError, BlobStore, ImageUpload, SasSigner, blob_name, check_name};

/// Blob store kept in process memory (tests, local runs without a directory).
#[derive(Debug)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
    signer: SasSigner,
}

impl InMemoryBlobStore {
    pub fn new(signer: SasSigner) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            signer,
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn save_image(&self, upload: ImageUpload) -> Result<String, BlobError> {
        let name = blob_name(&upload.file_name)?;
        self.blobs
            .write()
            .map_err(|_| BlobError::Poisoned)?
            .insert(name.clone(), upload.bytes);
        Ok(name)
    }

    async fn delete_image(&self, name: &str) -> Result<bool, BlobError> {
        check_name(name)?;
        Ok(self
            .blobs
            .write()
            .map_err(|_| BlobError::Poisoned)?
            .remove(name)
            .is_some())
    }

    async fn exists(&self, name: &str) -> Result<bool, BlobError> {
        check_name(name)?;
        Ok(self
            .blobs
            .read()
            .map_err(|_| BlobError::Poisoned)?
            .contains_key(name))
    }

    async fn read(&self, name: &str) -> Result<Option<Bytes>, BlobError> {
        check_name(name)?;
        Ok(self
            .blobs
            .read()
            .map_err(|_| BlobError::Poisoned)?
            .get(name)
            .cloned())
    }

    fn signer(&self) -> &SasSigner {
        &self.signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryBlobStore {
        InMemoryBlobStore::new(SasSigner::new(b"k", "http://localhost"))
    }

    #[tokio::test]
    async fn save_read_delete() {
        let store = store();
        let name = store
            .save_image(ImageUpload {
                file_name: "a.png".into(),
                bytes: Bytes::from_static(b"png"),
            })
            .await
            .unwrap();

        assert!(store.exists(&name).await.unwrap());
        assert_eq!(store.read(&name).await.unwrap().unwrap(), Bytes::from_static(b"png"));
        assert!(store.delete_image(&name).await.unwrap());
        assert!(!store.delete_image(&name).await.unwrap());
        assert!(store.is_empty());
    }
}
