//! `skillsgarden-locations`: locations, their components and hosted events.

pub mod component;
pub mod event;
pub mod location;

pub use component::{Component, ComponentPatch, NewComponent, dedup_ids};
pub use event::{Event, EventPatch, NewEvent, Registration, RegistrationError};
pub use location::{Location, LocationPatch, NewLocation};
