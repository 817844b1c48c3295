use skillsgarden_core::LocationId;
use skillsgarden_locations::{Location, LocationPatch, NewLocation};

use super::AppServices;
use crate::app::dto::LocationResponse;
use crate::app::errors::{ApiError, ErrorCode};
use crate::app::form::FormData;

impl AppServices {
    fn location_response(&self, location: Location) -> LocationResponse {
        let url = self.image_url(&location.image);
        LocationResponse::new(location, url)
    }

    pub async fn list_locations(&self) -> Result<Vec<LocationResponse>, ApiError> {
        let locations = self.repos.locations.list().await?;
        Ok(locations.into_iter().map(|l| self.location_response(l)).collect())
    }

    pub async fn get_location(&self, id: LocationId) -> Result<LocationResponse, ApiError> {
        let location = self.repos.locations.read(id).await?.ok_or(ErrorCode::LocationNotFound)?;
        Ok(self.location_response(location))
    }

    /// 404 `LOCATION_NOT_FOUND` unless the location exists.
    pub async fn ensure_location(&self, id: LocationId) -> Result<(), ApiError> {
        if !self.repos.locations.exists(id).await? {
            return Err(ErrorCode::LocationNotFound.into());
        }
        Ok(())
    }

    pub async fn create_location(&self, mut form: FormData) -> Result<LocationResponse, ApiError> {
        let (Some(name), Some(city), Some(lat), Some(lng), Some(image)) = (
            form.text("Name"),
            form.text("City"),
            form.double("Lat")?,
            form.double("Lng")?,
            form.take_image("Image"),
        ) else {
            return Err(ErrorCode::InvalidRequestBody.into());
        };

        let mut draft = NewLocation {
            name,
            city,
            lat,
            lng,
            image: String::new(),
        };
        draft.validate()?;
        draft.image = self.save_image(image).await?;

        let location = self.repos.locations.create(draft).await?;
        tracing::info!(location_id = %location.id, "location created");
        Ok(self.location_response(location))
    }

    pub async fn update_location(&self, id: LocationId, mut form: FormData) -> Result<LocationResponse, ApiError> {
        let current = self.repos.locations.read(id).await?.ok_or(ErrorCode::LocationNotFound)?;

        let mut patch = LocationPatch {
            name: form.text("Name"),
            city: form.text("City"),
            lat: form.double("Lat")?,
            lng: form.double("Lng")?,
            image: None,
        };
        patch.validate()?;
        if let Some(upload) = form.take_image("Image") {
            patch.image = Some(self.save_image(upload).await?);
        }

        let new_image = patch.image.clone();
        let outcome = self.repos.locations.update(id, patch).await;
        let location = self
            .settle_update(outcome, new_image.as_deref(), ErrorCode::LocationNotFound)
            .await?;
        if new_image.is_some() {
            self.discard_image(&current.image).await;
        }
        Ok(self.location_response(location))
    }

    /// Removes the location with its components and events, and their images.
    pub async fn delete_location(&self, id: LocationId) -> Result<(), ApiError> {
        let location = self.repos.locations.read(id).await?.ok_or(ErrorCode::LocationNotFound)?;
        let components = self.repos.components.list_by_location(id).await?;
        let events = self.repos.events.list_by_location(id).await?;

        if !self.repos.locations.delete(id).await? {
            return Err(ErrorCode::LocationNotFound.into());
        }

        self.discard_image(&location.image).await;
        for component in &components {
            self.discard_image(&component.image).await;
        }
        for event in &events {
            self.discard_image(&event.image).await;
        }
        tracing::info!(location_id = %id, "location deleted");
        Ok(())
    }
}
