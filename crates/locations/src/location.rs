use serde::{Deserialize, Serialize};

use skillsgarden_core::validation::{check_length, check_length_opt};
use skillsgarden_core::{DomainResult, Entity, LocationId};

/// A physical Skills Garden site.
///
/// `image` is the blob name, not a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub name: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
}

impl NewLocation {
    pub fn validate(&self) -> DomainResult<()> {
        check_length("Name", &self.name, 2, 50)?;
        check_length("City", &self.city, 2, 50)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image: Option<String>,
}

impl LocationPatch {
    pub fn validate(&self) -> DomainResult<()> {
        check_length_opt("Name", self.name.as_deref(), 2, 50)?;
        check_length_opt("City", self.city.as_deref(), 2, 50)?;
        Ok(())
    }

    pub fn apply(&self, location: &mut Location) {
        if let Some(v) = &self.name {
            location.name = v.clone();
        }
        if let Some(v) = &self.city {
            location.city = v.clone();
        }
        if let Some(v) = self.lat {
            location.lat = v;
        }
        if let Some(v) = self.lng {
            location.lng = v;
        }
        if let Some(v) = &self.image {
            location.image = v.clone();
        }
    }
}
