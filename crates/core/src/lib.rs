//! `skillsgarden-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    BeaconId, BeaconLogId, ComponentId, EventId, ExerciseId, LocationId, RegistrationId, UserId,
    WorkoutId,
};
