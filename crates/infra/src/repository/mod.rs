//! Persistence boundary.
//!
//! One generic CRUD contract ([`Repository`]) plus a per-entity trait for the
//! specialised queries. Services hold `Arc<dyn XxxRepository>` so the in-memory
//! and Postgres backends are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use skillsgarden_auth::{NewUser, User, UserPatch};
use skillsgarden_beacons::{Beacon, BeaconLog, BeaconPatch, NewBeacon, NewBeaconLog};
use skillsgarden_core::{Entity, EventId, ExerciseId, LocationId, UserId};
use skillsgarden_exercises::{
    Exercise, ExercisePatch, MovementForm, NewExercise, NewWorkout, Workout, WorkoutPatch,
};
use skillsgarden_locations::{
    Component, ComponentPatch, Event, EventPatch, Location, LocationPatch, NewComponent, NewEvent,
    NewLocation, Registration, RegistrationError,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database { operation: &'static str, message: String },

    /// A unique constraint was violated.
    #[error("conflict in {operation}: {message}")]
    Conflict { operation: &'static str, message: String },

    #[error("corrupt row in {operation}: {message}")]
    Corrupt { operation: &'static str, message: String },

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Generic CRUD contract over entity `E`.
///
/// `update` applies a partial patch and returns `None` when the row does not
/// exist; `delete` reports whether a row was removed. A single store
/// implements this once per entity.
#[async_trait]
pub trait Repository<E: Entity + Send + Sync + 'static>: Send + Sync {
    type Draft: Send + Sync + 'static;
    type Patch: Send + Sync + 'static;

    async fn create(&self, draft: Self::Draft) -> StoreResult<E>;
    async fn read(&self, id: E::Id) -> StoreResult<Option<E>>;
    async fn update(&self, id: E::Id, patch: Self::Patch) -> StoreResult<Option<E>>;
    async fn delete(&self, id: E::Id) -> StoreResult<bool>;
    async fn list(&self) -> StoreResult<Vec<E>>;

    async fn exists(&self, id: E::Id) -> StoreResult<bool> {
        Ok(self.read(id).await?.is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-entity contracts
// ─────────────────────────────────────────────────────────────────────────────

/// Deleting a location removes its components and events (with their links
/// and registrations) and detaches its beacons.
pub trait LocationRepository:
    Repository<Location, Draft = NewLocation, Patch = LocationPatch>
{
}

#[async_trait]
pub trait ComponentRepository:
    Repository<Component, Draft = NewComponent, Patch = ComponentPatch>
{
    async fn list_by_location(&self, location_id: LocationId) -> StoreResult<Vec<Component>>;
}

/// Outcome of an atomic registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(Registration),
    Rejected(RegistrationError),
    EventNotFound,
}

#[async_trait]
pub trait EventRepository: Repository<Event, Draft = NewEvent, Patch = EventPatch> {
    async fn list_by_location(&self, location_id: LocationId) -> StoreResult<Vec<Event>>;

    async fn exists_in_location(&self, event_id: EventId, location_id: LocationId) -> StoreResult<bool> {
        Ok(self
            .read(event_id)
            .await?
            .is_some_and(|e| e.location_id == location_id))
    }

    /// Check the registration rules and insert in one step.
    async fn create_registration(&self, event_id: EventId, user_id: UserId) -> StoreResult<RegisterOutcome>;

    async fn delete_registration(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool>;
    async fn registration_exists(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool>;
    async fn count_registrations(&self, event_id: EventId) -> StoreResult<usize>;
    async fn list_registered_events_for_user(&self, user_id: UserId) -> StoreResult<Vec<Event>>;
}

#[async_trait]
pub trait ExerciseRepository:
    Repository<Exercise, Draft = NewExercise, Patch = ExercisePatch>
{
    /// Exercises training any of `forms`; all exercises when `forms` is empty.
    async fn list_by_movement_forms(&self, forms: &[MovementForm]) -> StoreResult<Vec<Exercise>>;

    /// Existing exercises among `ids`, in the order given. Missing ids are skipped.
    async fn list_by_ids(&self, ids: &[ExerciseId]) -> StoreResult<Vec<Exercise>>;
}

pub trait WorkoutRepository:
    Repository<Workout, Draft = NewWorkout, Patch = WorkoutPatch>
{
}

#[async_trait]
pub trait BeaconRepository: Repository<Beacon, Draft = NewBeacon, Patch = BeaconPatch> {
    async fn log_user(&self, log: NewBeaconLog) -> StoreResult<BeaconLog>;
    async fn list_logs_by_user(&self, user_id: UserId) -> StoreResult<Vec<BeaconLog>>;
    /// Number of logs removed.
    async fn delete_logs_by_user(&self, user_id: UserId) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserRepository: Repository<User, Draft = NewUser, Patch = UserPatch> {
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────────────────────────────────────

/// Every repository the application needs, backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub locations: Arc<dyn LocationRepository>,
    pub components: Arc<dyn ComponentRepository>,
    pub events: Arc<dyn EventRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub workouts: Arc<dyn WorkoutRepository>,
    pub beacons: Arc<dyn BeaconRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: LocationRepository
            + ComponentRepository
            + EventRepository
            + ExerciseRepository
            + WorkoutRepository
            + BeaconRepository
            + UserRepository
            + 'static,
    {
        Self {
            locations: store.clone(),
            components: store.clone(),
            events: store.clone(),
            exercises: store.clone(),
            workouts: store.clone(),
            beacons: store.clone(),
            users: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    pub fn postgres(store: PgStore) -> Self {
        Self::from_store(Arc::new(store))
    }
}
