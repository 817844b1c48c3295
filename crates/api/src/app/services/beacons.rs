use chrono::Utc;

use skillsgarden_beacons::{Beacon, BeaconLog, BeaconPatch, NewBeacon, NewBeaconLog};
use skillsgarden_core::{BeaconId, UserId};

use super::AppServices;
use crate::app::dto::BeaconBody;
use crate::app::errors::{ApiError, ErrorCode};

impl AppServices {
    pub async fn list_beacons(&self) -> Result<Vec<Beacon>, ApiError> {
        Ok(self.repos.beacons.list().await?)
    }

    pub async fn get_beacon(&self, id: BeaconId) -> Result<Beacon, ApiError> {
        Ok(self.repos.beacons.read(id).await?.ok_or(ErrorCode::BeaconNotFound)?)
    }

    pub async fn create_beacon(&self, body: BeaconBody) -> Result<Beacon, ApiError> {
        let name = body.name.ok_or_else(|| ApiError::validation("Name is required"))?;
        let location_id = body
            .location_id
            .ok_or_else(|| ApiError::validation("LocationId is required"))?;
        let lat = body.lat.ok_or_else(|| ApiError::validation("Latitude is required"))?;
        let lng = body.lng.ok_or_else(|| ApiError::validation("Longitude is required"))?;

        let draft = NewBeacon { location_id, name, lat, lng };
        draft.validate()?;
        self.ensure_location(location_id).await?;

        let beacon = self.repos.beacons.create(draft).await?;
        tracing::info!(beacon_id = %beacon.id, location_id = %location_id, "beacon created");
        Ok(beacon)
    }

    pub async fn update_beacon(&self, id: BeaconId, body: BeaconBody) -> Result<Beacon, ApiError> {
        if !self.repos.beacons.exists(id).await? {
            return Err(ErrorCode::BeaconNotFound.into());
        }

        let patch = BeaconPatch {
            location_id: body.location_id,
            name: body.name,
            lat: body.lat,
            lng: body.lng,
        };
        patch.validate()?;
        if let Some(location_id) = patch.location_id {
            self.ensure_location(location_id).await?;
        }

        Ok(self
            .repos
            .beacons
            .update(id, patch)
            .await?
            .ok_or(ErrorCode::BeaconNotFound)?)
    }

    pub async fn delete_beacon(&self, id: BeaconId) -> Result<(), ApiError> {
        if !self.repos.beacons.delete(id).await? {
            return Err(ErrorCode::BeaconNotFound.into());
        }
        tracing::info!(beacon_id = %id, "beacon deleted");
        Ok(())
    }

    /// Record that `user_id` scanned `beacon_id` now.
    pub async fn log_beacon(&self, user_id: UserId, beacon_id: BeaconId) -> Result<BeaconLog, ApiError> {
        if !self.repos.beacons.exists(beacon_id).await? {
            return Err(ErrorCode::BeaconNotFound.into());
        }
        let log = self
            .repos
            .beacons
            .log_user(NewBeaconLog {
                beacon_id,
                user_id,
                timestamp: Utc::now(),
            })
            .await?;
        tracing::debug!(log_id = %log.id, beacon_id = %beacon_id, "beacon scan logged");
        Ok(log)
    }

    pub async fn beacon_logs(&self, user_id: UserId) -> Result<Vec<BeaconLog>, ApiError> {
        Ok(self.repos.beacons.list_logs_by_user(user_id).await?)
    }

    pub async fn delete_beacon_logs(&self, user_id: UserId) -> Result<(), ApiError> {
        if !self.repos.users.exists(user_id).await? {
            return Err(ErrorCode::UserNotFound.into());
        }
        let removed = self.repos.beacons.delete_logs_by_user(user_id).await?;
        tracing::info!(user_id = %user_id, removed, "beacon logs deleted");
        Ok(())
    }
}
