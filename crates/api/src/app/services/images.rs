use bytes::Bytes;
use chrono::Utc;

use skillsgarden_core::validation::image_extension;
use skillsgarden_infra::SasQuery;

use super::AppServices;
use crate::app::errors::{ApiError, ErrorCode};

/// Content type for a stored image name.
pub fn image_content_type(name: &str) -> &'static str {
    match image_extension(name) {
        Some(".png") => "image/png",
        Some(".jpg" | ".jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

impl AppServices {
    /// Bytes of a stored image, provided `query` carries a valid signature.
    pub async fn fetch_image(&self, name: &str, query: &SasQuery) -> Result<Bytes, ApiError> {
        if let Err(e) = self.blobs.signer().verify(name, query, Utc::now()) {
            tracing::debug!(error = %e, image = name, "rejected image signature");
            return Err(ErrorCode::RoleNoPermissions.into());
        }
        Ok(self.blobs.read(name).await?.ok_or(ErrorCode::ImageNotFound)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(image_content_type("a.png"), "image/png");
        assert_eq!(image_content_type("a.JPEG"), "image/jpeg");
        assert_eq!(image_content_type("a.gif"), "application/octet-stream");
    }
}
