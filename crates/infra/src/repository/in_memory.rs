//! In-memory store for tests/dev.
//!
//! All tables sit behind one `RwLock`, so cascading deletes and the
//! registration check-then-insert are atomic. The lock is never held across an
//! `.await`.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use skillsgarden_auth::{NewUser, User, UserPatch, normalize_email};
use skillsgarden_beacons::{Beacon, BeaconLog, BeaconPatch, NewBeacon, NewBeaconLog};
use skillsgarden_core::{
    BeaconId, BeaconLogId, ComponentId, EventId, ExerciseId, LocationId, RegistrationId, UserId,
    WorkoutId,
};
use skillsgarden_exercises::{
    Exercise, ExercisePatch, MovementForm, NewExercise, NewWorkout, Workout, WorkoutPatch,
};
use skillsgarden_locations::{
    Component, ComponentPatch, Event, EventPatch, Location, LocationPatch, NewComponent, NewEvent,
    NewLocation, Registration, dedup_ids,
};

use super::{
    BeaconRepository, ComponentRepository, EventRepository, ExerciseRepository,
    LocationRepository, RegisterOutcome, Repository, StoreError, StoreResult, UserRepository,
    WorkoutRepository,
};

#[derive(Debug, Default)]
struct Sequences {
    location: i32,
    component: i32,
    event: i32,
    registration: i32,
    exercise: i32,
    workout: i32,
    beacon: i32,
    beacon_log: i64,
    user: i32,
}

fn next_i32(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    locations: BTreeMap<LocationId, Location>,
    components: BTreeMap<ComponentId, Component>,
    events: BTreeMap<EventId, Event>,
    registrations: BTreeMap<RegistrationId, Registration>,
    exercises: BTreeMap<ExerciseId, Exercise>,
    workouts: BTreeMap<WorkoutId, Workout>,
    beacons: BTreeMap<BeaconId, Beacon>,
    beacon_logs: BTreeMap<BeaconLogId, BeaconLog>,
    users: BTreeMap<UserId, User>,
}

impl Tables {
    fn registrations_for(&self, event_id: EventId) -> impl Iterator<Item = &Registration> {
        self.registrations.values().filter(move |r| r.event_id == event_id)
    }

    fn remove_event(&mut self, event_id: EventId) -> bool {
        let removed = self.events.remove(&event_id).is_some();
        self.registrations.retain(|_, r| r.event_id != event_id);
        removed
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_tables(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_tables(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Location> for InMemoryStore {
    type Draft = NewLocation;
    type Patch = LocationPatch;

    async fn create(&self, draft: NewLocation) -> StoreResult<Location> {
        let mut t = self.write_tables()?;
        let id = LocationId::new(next_i32(&mut t.seq.location));
        let location = Location {
            id,
            name: draft.name,
            city: draft.city,
            lat: draft.lat,
            lng: draft.lng,
            image: draft.image,
        };
        t.locations.insert(id, location.clone());
        Ok(location)
    }

    async fn read(&self, id: LocationId) -> StoreResult<Option<Location>> {
        Ok(self.read_tables()?.locations.get(&id).cloned())
    }

    async fn update(&self, id: LocationId, patch: LocationPatch) -> StoreResult<Option<Location>> {
        let mut t = self.write_tables()?;
        Ok(t.locations.get_mut(&id).map(|loc| {
            patch.apply(loc);
            loc.clone()
        }))
    }

    async fn delete(&self, id: LocationId) -> StoreResult<bool> {
        let mut t = self.write_tables()?;
        if t.locations.remove(&id).is_none() {
            return Ok(false);
        }
        t.components.retain(|_, c| c.location_id != id);
        let events: Vec<EventId> = t
            .events
            .values()
            .filter(|e| e.location_id == id)
            .map(|e| e.id)
            .collect();
        for event_id in events {
            t.remove_event(event_id);
        }
        for beacon in t.beacons.values_mut() {
            if beacon.location_id == Some(id) {
                beacon.location_id = None;
            }
        }
        Ok(true)
    }

    async fn list(&self) -> StoreResult<Vec<Location>> {
        Ok(self.read_tables()?.locations.values().cloned().collect())
    }
}

impl LocationRepository for InMemoryStore {}

// ─────────────────────────────────────────────────────────────────────────────
// Components
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Component> for InMemoryStore {
    type Draft = NewComponent;
    type Patch = ComponentPatch;

    async fn create(&self, draft: NewComponent) -> StoreResult<Component> {
        let mut t = self.write_tables()?;
        let id = ComponentId::new(next_i32(&mut t.seq.component));
        let component = Component {
            id,
            location_id: draft.location_id,
            name: draft.name,
            description: draft.description,
            image: draft.image,
            exercises: dedup_ids(&draft.exercises),
        };
        t.components.insert(id, component.clone());
        Ok(component)
    }

    async fn read(&self, id: ComponentId) -> StoreResult<Option<Component>> {
        Ok(self.read_tables()?.components.get(&id).cloned())
    }

    async fn update(&self, id: ComponentId, patch: ComponentPatch) -> StoreResult<Option<Component>> {
        let mut t = self.write_tables()?;
        Ok(t.components.get_mut(&id).map(|c| {
            patch.apply(c);
            c.clone()
        }))
    }

    async fn delete(&self, id: ComponentId) -> StoreResult<bool> {
        Ok(self.write_tables()?.components.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<Component>> {
        Ok(self.read_tables()?.components.values().cloned().collect())
    }
}

#[async_trait]
impl ComponentRepository for InMemoryStore {
    async fn list_by_location(&self, location_id: LocationId) -> StoreResult<Vec<Component>> {
        Ok(self
            .read_tables()?
            .components
            .values()
            .filter(|c| c.location_id == location_id)
            .cloned()
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events + registrations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Event> for InMemoryStore {
    type Draft = NewEvent;
    type Patch = EventPatch;

    async fn create(&self, draft: NewEvent) -> StoreResult<Event> {
        let mut t = self.write_tables()?;
        let id = EventId::new(next_i32(&mut t.seq.event));
        let event = Event {
            id,
            location_id: draft.location_id,
            organisor_id: draft.organisor_id,
            title: draft.title,
            description: draft.description,
            start_time: Some(draft.start_time),
            max_registrations: Some(draft.max_registrations),
            image: draft.image,
        };
        t.events.insert(id, event.clone());
        Ok(event)
    }

    async fn read(&self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.read_tables()?.events.get(&id).cloned())
    }

    async fn update(&self, id: EventId, patch: EventPatch) -> StoreResult<Option<Event>> {
        let mut t = self.write_tables()?;
        Ok(t.events.get_mut(&id).map(|e| {
            patch.apply(e);
            e.clone()
        }))
    }

    async fn delete(&self, id: EventId) -> StoreResult<bool> {
        Ok(self.write_tables()?.remove_event(id))
    }

    async fn list(&self) -> StoreResult<Vec<Event>> {
        Ok(self.read_tables()?.events.values().cloned().collect())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn list_by_location(&self, location_id: LocationId) -> StoreResult<Vec<Event>> {
        Ok(self
            .read_tables()?
            .events
            .values()
            .filter(|e| e.location_id == location_id)
            .cloned()
            .collect())
    }

    async fn create_registration(&self, event_id: EventId, user_id: UserId) -> StoreResult<RegisterOutcome> {
        let mut t = self.write_tables()?;
        let Some(event) = t.events.get(&event_id) else {
            return Ok(RegisterOutcome::EventNotFound);
        };
        let already = t.registrations_for(event_id).any(|r| r.user_id == user_id);
        let count = t.registrations_for(event_id).count();
        if let Err(e) = event.check_registration(user_id, already, count) {
            return Ok(RegisterOutcome::Rejected(e));
        }

        let id = RegistrationId::new(next_i32(&mut t.seq.registration));
        let registration = Registration { id, event_id, user_id };
        t.registrations.insert(id, registration);
        Ok(RegisterOutcome::Registered(registration))
    }

    async fn delete_registration(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool> {
        let mut t = self.write_tables()?;
        let before = t.registrations.len();
        t.registrations
            .retain(|_, r| !(r.event_id == event_id && r.user_id == user_id));
        Ok(t.registrations.len() != before)
    }

    async fn registration_exists(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool> {
        Ok(self
            .read_tables()?
            .registrations_for(event_id)
            .any(|r| r.user_id == user_id))
    }

    async fn count_registrations(&self, event_id: EventId) -> StoreResult<usize> {
        Ok(self.read_tables()?.registrations_for(event_id).count())
    }

    async fn list_registered_events_for_user(&self, user_id: UserId) -> StoreResult<Vec<Event>> {
        let t = self.read_tables()?;
        Ok(t.registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| t.events.get(&r.event_id).cloned())
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exercises
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Exercise> for InMemoryStore {
    type Draft = NewExercise;
    type Patch = ExercisePatch;

    async fn create(&self, draft: NewExercise) -> StoreResult<Exercise> {
        let mut t = self.write_tables()?;
        let id = ExerciseId::new(next_i32(&mut t.seq.exercise));
        let exercise = Exercise {
            id,
            name: draft.name,
            media: draft.media,
            requirements: draft.requirements,
            steps: draft.steps,
            forms: draft.forms,
        };
        t.exercises.insert(id, exercise.clone());
        Ok(exercise)
    }

    async fn read(&self, id: ExerciseId) -> StoreResult<Option<Exercise>> {
        Ok(self.read_tables()?.exercises.get(&id).cloned())
    }

    async fn update(&self, id: ExerciseId, patch: ExercisePatch) -> StoreResult<Option<Exercise>> {
        let mut t = self.write_tables()?;
        Ok(t.exercises.get_mut(&id).map(|e| {
            patch.apply(e);
            e.clone()
        }))
    }

    async fn delete(&self, id: ExerciseId) -> StoreResult<bool> {
        let mut t = self.write_tables()?;
        if t.exercises.remove(&id).is_none() {
            return Ok(false);
        }
        for c in t.components.values_mut() {
            c.exercises.retain(|e| *e != id);
        }
        for w in t.workouts.values_mut() {
            w.exercises.retain(|e| *e != id);
        }
        Ok(true)
    }

    async fn list(&self) -> StoreResult<Vec<Exercise>> {
        Ok(self.read_tables()?.exercises.values().cloned().collect())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryStore {
    async fn list_by_movement_forms(&self, forms: &[MovementForm]) -> StoreResult<Vec<Exercise>> {
        Ok(self
            .read_tables()?
            .exercises
            .values()
            .filter(|e| e.trains_any(forms))
            .cloned()
            .collect())
    }

    async fn list_by_ids(&self, ids: &[ExerciseId]) -> StoreResult<Vec<Exercise>> {
        let t = self.read_tables()?;
        Ok(ids.iter().filter_map(|id| t.exercises.get(id).cloned()).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workouts
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Workout> for InMemoryStore {
    type Draft = NewWorkout;
    type Patch = WorkoutPatch;

    async fn create(&self, draft: NewWorkout) -> StoreResult<Workout> {
        let mut t = self.write_tables()?;
        let id = WorkoutId::new(next_i32(&mut t.seq.workout));
        let workout = Workout {
            id,
            name: draft.name,
            kind: draft.kind,
            exercises: draft.exercises,
        };
        t.workouts.insert(id, workout.clone());
        Ok(workout)
    }

    async fn read(&self, id: WorkoutId) -> StoreResult<Option<Workout>> {
        Ok(self.read_tables()?.workouts.get(&id).cloned())
    }

    async fn update(&self, id: WorkoutId, patch: WorkoutPatch) -> StoreResult<Option<Workout>> {
        let mut t = self.write_tables()?;
        Ok(t.workouts.get_mut(&id).map(|w| {
            patch.apply(w);
            w.clone()
        }))
    }

    async fn delete(&self, id: WorkoutId) -> StoreResult<bool> {
        Ok(self.write_tables()?.workouts.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<Workout>> {
        Ok(self.read_tables()?.workouts.values().cloned().collect())
    }
}

impl WorkoutRepository for InMemoryStore {}

// ─────────────────────────────────────────────────────────────────────────────
// Beacons
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Beacon> for InMemoryStore {
    type Draft = NewBeacon;
    type Patch = BeaconPatch;

    async fn create(&self, draft: NewBeacon) -> StoreResult<Beacon> {
        let mut t = self.write_tables()?;
        let id = BeaconId::new(next_i32(&mut t.seq.beacon));
        let beacon = Beacon {
            id,
            location_id: Some(draft.location_id),
            name: draft.name,
            lat: Some(draft.lat),
            lng: Some(draft.lng),
        };
        t.beacons.insert(id, beacon.clone());
        Ok(beacon)
    }

    async fn read(&self, id: BeaconId) -> StoreResult<Option<Beacon>> {
        Ok(self.read_tables()?.beacons.get(&id).cloned())
    }

    async fn update(&self, id: BeaconId, patch: BeaconPatch) -> StoreResult<Option<Beacon>> {
        let mut t = self.write_tables()?;
        Ok(t.beacons.get_mut(&id).map(|b| {
            patch.apply(b);
            b.clone()
        }))
    }

    async fn delete(&self, id: BeaconId) -> StoreResult<bool> {
        let mut t = self.write_tables()?;
        let removed = t.beacons.remove(&id).is_some();
        t.beacon_logs.retain(|_, l| l.beacon_id != id);
        Ok(removed)
    }

    async fn list(&self) -> StoreResult<Vec<Beacon>> {
        Ok(self.read_tables()?.beacons.values().cloned().collect())
    }
}

#[async_trait]
impl BeaconRepository for InMemoryStore {
    async fn log_user(&self, log: NewBeaconLog) -> StoreResult<BeaconLog> {
        let mut t = self.write_tables()?;
        t.seq.beacon_log += 1;
        let id = BeaconLogId::new(t.seq.beacon_log);
        let entry = BeaconLog {
            id,
            beacon_id: log.beacon_id,
            user_id: log.user_id,
            timestamp: log.timestamp,
        };
        t.beacon_logs.insert(id, entry);
        Ok(entry)
    }

    async fn list_logs_by_user(&self, user_id: UserId) -> StoreResult<Vec<BeaconLog>> {
        Ok(self
            .read_tables()?
            .beacon_logs
            .values()
            .filter(|l| l.user_id == user_id)
            .copied()
            .collect())
    }

    async fn delete_logs_by_user(&self, user_id: UserId) -> StoreResult<u64> {
        let mut t = self.write_tables()?;
        let before = t.beacon_logs.len();
        t.beacon_logs.retain(|_, l| l.user_id != user_id);
        Ok((before - t.beacon_logs.len()) as u64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<User> for InMemoryStore {
    type Draft = NewUser;
    type Patch = UserPatch;

    async fn create(&self, draft: NewUser) -> StoreResult<User> {
        let mut t = self.write_tables()?;
        let email = normalize_email(&draft.email);
        if t.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict {
                operation: "create_user",
                message: "email already exists".into(),
            });
        }
        let id = UserId::new(next_i32(&mut t.seq.user));
        let user = User {
            id,
            name: draft.name,
            email,
            password_hash: draft.password_hash,
            date_of_birth: Some(draft.date_of_birth),
            gender: Some(draft.gender),
            role: draft.role,
        };
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn read(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read_tables()?.users.get(&id).cloned())
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut t = self.write_tables()?;
        if let Some(email) = patch.email.as_deref().map(normalize_email) {
            if t.users.values().any(|u| u.email == email && u.id != id) {
                return Err(StoreError::Conflict {
                    operation: "update_user",
                    message: "email already exists".into(),
                });
            }
        }
        Ok(t.users.get_mut(&id).map(|u| {
            patch.apply(u);
            u.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> StoreResult<bool> {
        let mut t = self.write_tables()?;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.registrations.retain(|_, r| r.user_id != id);
        t.beacon_logs.retain(|_, l| l.user_id != id);
        Ok(true)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.read_tables()?.users.values().cloned().collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .read_tables()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repositories;
    use chrono::{Duration, Utc};
    use skillsgarden_auth::{Gender, Role};
    use skillsgarden_beacons::NewBeacon;
    use skillsgarden_locations::RegistrationError;

    fn new_location(name: &str) -> NewLocation {
        NewLocation {
            name: name.into(),
            city: "Breda".into(),
            lat: 51.5,
            lng: 4.7,
            image: "loc.png".into(),
        }
    }

    fn new_event(location_id: LocationId, organiser: UserId, max: i32) -> NewEvent {
        NewEvent {
            location_id,
            organisor_id: organiser,
            title: "Bootcamp".into(),
            description: "Training".into(),
            start_time: Utc::now() + Duration::days(1),
            max_registrations: max,
            image: "event.png".into(),
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Pete".into(),
            email: email.into(),
            password_hash: "hash".into(),
            date_of_birth: Utc::now() - Duration::days(9000),
            gender: Gender::Male,
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_per_table() {
        let repos = Repositories::in_memory();
        let a = repos.locations.create(new_location("A1")).await.unwrap();
        let b = repos.locations.create(new_location("B1")).await.unwrap();
        assert_eq!(a.id.get(), 1);
        assert_eq!(b.id.get(), 2);
        assert_eq!(repos.locations.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deleting_location_cascades() {
        let repos = Repositories::in_memory();
        let loc = repos.locations.create(new_location("Park")).await.unwrap();
        let other = repos.locations.create(new_location("Other")).await.unwrap();

        let comp = repos
            .components
            .create(NewComponent {
                location_id: loc.id,
                name: "Bar".into(),
                description: "Pull-up bar".into(),
                image: "c.png".into(),
                exercises: vec![],
            })
            .await
            .unwrap();
        let event = repos.events.create(new_event(loc.id, UserId::new(1), 5)).await.unwrap();
        let kept = repos.events.create(new_event(other.id, UserId::new(1), 5)).await.unwrap();
        repos.events.create_registration(event.id, UserId::new(2)).await.unwrap();
        let beacon = repos
            .beacons
            .create(NewBeacon { location_id: loc.id, name: "Gate".into(), lat: 1.0, lng: 2.0 })
            .await
            .unwrap();

        assert!(repos.locations.delete(loc.id).await.unwrap());

        assert!(repos.components.read(comp.id).await.unwrap().is_none());
        assert!(repos.events.read(event.id).await.unwrap().is_none());
        assert_eq!(repos.events.count_registrations(event.id).await.unwrap(), 0);
        assert!(repos.events.read(kept.id).await.unwrap().is_some());
        let beacon = repos.beacons.read(beacon.id).await.unwrap().unwrap();
        assert_eq!(beacon.location_id, None);

        assert!(!repos.locations.delete(loc.id).await.unwrap());
    }

    #[tokio::test]
    async fn registration_rules_are_enforced_atomically() {
        let repos = Repositories::in_memory();
        let loc = repos.locations.create(new_location("Park")).await.unwrap();
        let organiser = UserId::new(10);
        let event = repos.events.create(new_event(loc.id, organiser, 1)).await.unwrap();

        assert_eq!(
            repos.events.create_registration(event.id, organiser).await.unwrap(),
            RegisterOutcome::Rejected(RegistrationError::OwnEvent)
        );
        assert!(matches!(
            repos.events.create_registration(event.id, UserId::new(1)).await.unwrap(),
            RegisterOutcome::Registered(_)
        ));
        assert_eq!(
            repos.events.create_registration(event.id, UserId::new(1)).await.unwrap(),
            RegisterOutcome::Rejected(RegistrationError::AlreadyRegistered)
        );
        assert_eq!(
            repos.events.create_registration(event.id, UserId::new(2)).await.unwrap(),
            RegisterOutcome::Rejected(RegistrationError::LimitReached)
        );
        assert_eq!(
            repos.events.create_registration(EventId::new(99), UserId::new(2)).await.unwrap(),
            RegisterOutcome::EventNotFound
        );

        let registered = repos.events.list_registered_events_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(registered.len(), 1);
        assert!(repos.events.delete_registration(event.id, UserId::new(1)).await.unwrap());
        assert!(!repos.events.delete_registration(event.id, UserId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_exercise_unlinks_it() {
        let repos = Repositories::in_memory();
        let ex = repos
            .exercises
            .create(NewExercise::new("Pull-up".into(), None, vec![], &[], &[MovementForm::Klimmen]))
            .await
            .unwrap();
        let keep = repos
            .exercises
            .create(NewExercise::new("Roll".into(), None, vec![], &[], &[MovementForm::Rollen]))
            .await
            .unwrap();
        let workout = repos
            .workouts
            .create(NewWorkout { name: "Mix".into(), kind: "Full".into(), exercises: vec![ex.id, keep.id] })
            .await
            .unwrap();

        let by_form = repos
            .exercises
            .list_by_movement_forms(&[MovementForm::Rollen])
            .await
            .unwrap();
        assert_eq!(by_form.len(), 1);

        assert!(repos.exercises.delete(ex.id).await.unwrap());
        let workout = repos.workouts.read(workout.id).await.unwrap().unwrap();
        assert_eq!(workout.exercises, vec![keep.id]);
        assert_eq!(repos.exercises.list_by_ids(&[ex.id, keep.id]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let repos = Repositories::in_memory();
        let user = repos.users.create(new_user("Pete@Mail.com")).await.unwrap();
        assert_eq!(user.email, "pete@mail.com");

        let err = repos.users.create(new_user("pete@mail.COM")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let found = repos.users.find_by_email("PETE@mail.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn beacon_logs_per_user() {
        let repos = Repositories::in_memory();
        let loc = repos.locations.create(new_location("Park")).await.unwrap();
        let beacon = repos
            .beacons
            .create(NewBeacon { location_id: loc.id, name: "Gate".into(), lat: 1.0, lng: 2.0 })
            .await
            .unwrap();
        for user in [1, 1, 2] {
            repos
                .beacons
                .log_user(NewBeaconLog { beacon_id: beacon.id, user_id: UserId::new(user), timestamp: Utc::now() })
                .await
                .unwrap();
        }
        assert_eq!(repos.beacons.list_logs_by_user(UserId::new(1)).await.unwrap().len(), 2);
        assert_eq!(repos.beacons.delete_logs_by_user(UserId::new(1)).await.unwrap(), 2);
        assert_eq!(repos.beacons.list_logs_by_user(UserId::new(2)).await.unwrap().len(), 1);
    }
}
