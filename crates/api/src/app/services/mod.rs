//! Service layer: business rules between the handlers and the repositories.
//!
//! One [`AppServices`] value is shared by every handler. Its methods are split
//! per resource across the files of this module and return response DTOs
//! with image names already resolved to signed URLs.

use std::sync::Arc;

use chrono::Utc;

use skillsgarden_auth::{PasswordHasher, TokenService};
use skillsgarden_infra::{
    AppConfig, BlobStore, ImageUpload, InMemoryBlobStore, LocalBlobStore, PgStore, Repositories, SasSigner, StoreError,
};

use crate::app::errors::{ApiError, ErrorCode};

mod accounts;
mod beacons;
mod components;
mod events;
mod exercises;
pub mod images;
mod locations;
mod workouts;

pub struct AppServices {
    pub repos: Repositories,
    pub blobs: Arc<dyn BlobStore>,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
}

impl AppServices {
    pub fn new(
        repos: Repositories,
        blobs: Arc<dyn BlobStore>,
        tokens: TokenService,
        passwords: PasswordHasher,
    ) -> Self {
        Self {
            repos,
            blobs,
            tokens,
            passwords,
        }
    }

    /// Signed URL for a stored image; empty names stay empty.
    fn image_url(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        self.blobs.sas_url(name, Utc::now())
    }

    async fn save_image(&self, upload: ImageUpload) -> Result<String, ApiError> {
        Ok(self.blobs.save_image(upload).await?)
    }

    /// Best effort: a failed removal leaves an orphaned blob, not a failed request.
    async fn discard_image(&self, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Err(e) = self.blobs.delete_image(name).await {
            tracing::warn!(error = %e, image = name, "failed to delete image");
        }
    }

    /// Outcome of an update that may carry a freshly saved image. The new
    /// image is discarded when the row was not written.
    async fn settle_update<T>(
        &self,
        outcome: Result<Option<T>, StoreError>,
        new_image: Option<&str>,
        missing: ErrorCode,
    ) -> Result<T, ApiError> {
        match outcome {
            Ok(Some(row)) => Ok(row),
            outcome => {
                if let Some(name) = new_image {
                    self.discard_image(name).await;
                }
                Err(match outcome {
                    Err(e) => e.into(),
                    Ok(_) => missing.into(),
                })
            }
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// a filesystem blob store when `BLOB_STORAGE_PATH` is set, memory otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let repos = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            tracing::info!("connected to postgres and applied migrations");
            Repositories::postgres(store)
        }
        None => Repositories::in_memory(),
    };

    let signer = SasSigner::new(config.blob.signing_key.as_bytes(), config.blob.public_url.clone());
    let blobs: Arc<dyn BlobStore> = match &config.blob.storage_path {
        Some(path) => Arc::new(LocalBlobStore::open(path, signer).await?),
        None => Arc::new(InMemoryBlobStore::new(signer)),
    };

    let services = AppServices::new(
        repos,
        blobs,
        TokenService::new(&config.jwt),
        PasswordHasher::with_cost(config.bcrypt_cost),
    );

    if let Some(seed) = &config.admin {
        services.ensure_admin(seed).await?;
    }

    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn services() -> AppServices {
        let mut config = AppConfig::default();
        config.bcrypt_cost = 4;
        build_services(&config).await.unwrap()
    }

    fn upload() -> ImageUpload {
        ImageUpload {
            file_name: "bench.png".to_string(),
            bytes: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn unwritten_update_discards_the_new_image() {
        let services = services().await;
        let name = services.save_image(upload()).await.unwrap();
        assert!(services.blobs.exists(&name).await.unwrap());

        let err = services
            .settle_update::<()>(Ok(None), Some(&name), ErrorCode::ComponentNotFound)
            .await
            .unwrap_err();
        assert_eq!(err.code, 4046);
        assert!(!services.blobs.exists(&name).await.unwrap());
    }

    #[tokio::test]
    async fn written_update_keeps_the_new_image() {
        let services = services().await;
        let name = services.save_image(upload()).await.unwrap();

        let row = services
            .settle_update(Ok(Some(7)), Some(&name), ErrorCode::EventNotFound)
            .await
            .unwrap();
        assert_eq!(row, 7);
        assert!(services.blobs.exists(&name).await.unwrap());
    }
}
