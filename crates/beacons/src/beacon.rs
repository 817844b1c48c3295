use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillsgarden_core::validation::{check_length, check_length_opt};
use skillsgarden_core::{BeaconId, BeaconLogId, DomainResult, Entity, LocationId, UserId};

/// A physical proximity marker. Detached from its location when the location
/// is deleted, hence the optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    pub id: BeaconId,
    pub location_id: Option<LocationId>,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Entity for Beacon {
    type Id = BeaconId;

    fn id(&self) -> BeaconId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBeacon {
    pub location_id: LocationId,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl NewBeacon {
    pub fn validate(&self) -> DomainResult<()> {
        check_length("Name", &self.name, 2, 50)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeaconPatch {
    pub location_id: Option<LocationId>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl BeaconPatch {
    pub fn validate(&self) -> DomainResult<()> {
        check_length_opt("Name", self.name.as_deref(), 2, 50)
    }

    pub fn apply(&self, beacon: &mut Beacon) {
        if let Some(v) = self.location_id {
            beacon.location_id = Some(v);
        }
        if let Some(v) = &self.name {
            beacon.name = v.clone();
        }
        if let Some(v) = self.lat {
            beacon.lat = Some(v);
        }
        if let Some(v) = self.lng {
            beacon.lng = Some(v);
        }
    }
}

/// One scan of a beacon by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconLog {
    pub id: BeaconLogId,
    pub beacon_id: BeaconId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

impl Entity for BeaconLog {
    type Id = BeaconLogId;

    fn id(&self) -> BeaconLogId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBeaconLog {
    pub beacon_id: BeaconId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_checked() {
        let b = NewBeacon { location_id: LocationId::new(1), name: "B".into(), lat: 0.0, lng: 0.0 };
        assert_eq!(b.validate().unwrap_err().to_string(), "Name must be at least 2 characters");
    }

    #[test]
    fn patch_moves_beacon() {
        let mut b = Beacon {
            id: BeaconId::new(1),
            location_id: None,
            name: "Gate".into(),
            lat: None,
            lng: None,
        };
        BeaconPatch { location_id: Some(LocationId::new(4)), lat: Some(1.5), ..Default::default() }.apply(&mut b);
        assert_eq!(b.location_id, Some(LocationId::new(4)));
        assert_eq!(b.lat, Some(1.5));
        assert_eq!(b.lng, None);
        assert_eq!(b.name, "Gate");
    }
}
