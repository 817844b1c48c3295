//! Locations, components and events (with registrations).

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Row};
use tracing::{Span, instrument};

use skillsgarden_core::{ComponentId, EventId, ExerciseId, LocationId, RegistrationId, UserId};
use skillsgarden_locations::{
    Component, ComponentPatch, Event, EventPatch, Location, LocationPatch, NewComponent, NewEvent,
    NewLocation, Registration, dedup_ids,
};

use super::{PgStore, commit, map_sqlx_error};
use crate::repository::{
    ComponentRepository, EventRepository, LocationRepository, RegisterOutcome, Repository,
    StoreResult,
};

// SQLx row types

struct LocationRow(Location);

impl<'r> FromRow<'r, PgRow> for LocationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LocationRow(Location {
            id: LocationId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            city: row.try_get("city")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
            image: row.try_get("image")?,
        }))
    }
}

/// Component without its exercise links.
struct ComponentRow(Component);

impl<'r> FromRow<'r, PgRow> for ComponentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ComponentRow(Component {
            id: ComponentId::new(row.try_get("id")?),
            location_id: LocationId::new(row.try_get("location_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            exercises: Vec::new(),
        }))
    }
}

struct EventRow(Event);

impl<'r> FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EventRow(Event {
            id: EventId::new(row.try_get("id")?),
            location_id: LocationId::new(row.try_get("location_id")?),
            organisor_id: UserId::new(row.try_get("organisor_id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            start_time: row.try_get("start_time")?,
            max_registrations: row.try_get("max_registrations")?,
            image: row.try_get("image")?,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Location> for PgStore {
    type Draft = NewLocation;
    type Patch = LocationPatch;

    #[instrument(skip(self, draft), err)]
    async fn create(&self, draft: NewLocation) -> StoreResult<Location> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO locations (name, city, lat, lng, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, city, lat, lng, image
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.city)
        .bind(draft.lat)
        .bind(draft.lng)
        .bind(&draft.image)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_location", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(location_id = %id), err)]
    async fn read(&self, id: LocationId) -> StoreResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, name, city, lat, lng, image
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_location", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, patch), fields(location_id = %id), err)]
    async fn update(&self, id: LocationId, patch: LocationPatch) -> StoreResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            UPDATE locations SET
                name = COALESCE($2, name),
                city = COALESCE($3, city),
                lat = COALESCE($4, lat),
                lng = COALESCE($5, lng),
                image = COALESCE($6, image)
            WHERE id = $1
            RETURNING id, name, city, lat, lng, image
            "#,
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.city)
        .bind(patch.lat)
        .bind(patch.lng)
        .bind(patch.image)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_location", e))?;
        Ok(row.map(|r| r.0))
    }

    /// Components, events and registrations cascade; beacons are detached.
    #[instrument(skip(self), fields(location_id = %id), err)]
    async fn delete(&self, id: LocationId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_location", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, name, city, lat, lng, image
            FROM locations
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_locations", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

impl LocationRepository for PgStore {}

// ─────────────────────────────────────────────────────────────────────────────
// Components
// ─────────────────────────────────────────────────────────────────────────────

async fn attach_component_exercises(
    conn: &mut PgConnection,
    rows: Vec<ComponentRow>,
) -> StoreResult<Vec<Component>> {
    let ids: Vec<i32> = rows.iter().map(|r| r.0.id.get()).collect();
    let links = sqlx::query(
        r#"
        SELECT component_id, exercise_id
        FROM component_exercises
        WHERE component_id = ANY($1)
        ORDER BY component_id ASC, position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load_component_exercises", e))?;

    let mut by_component: HashMap<i32, Vec<ExerciseId>> = HashMap::new();
    for link in links {
        let component_id: i32 = link
            .try_get("component_id")
            .map_err(|e| map_sqlx_error("load_component_exercises", e))?;
        let exercise_id: i32 = link
            .try_get("exercise_id")
            .map_err(|e| map_sqlx_error("load_component_exercises", e))?;
        by_component
            .entry(component_id)
            .or_default()
            .push(ExerciseId::new(exercise_id));
    }

    Ok(rows
        .into_iter()
        .map(|ComponentRow(mut c)| {
            c.exercises = by_component.remove(&c.id.get()).unwrap_or_default();
            c
        })
        .collect())
}

async fn replace_component_exercises(
    conn: &mut PgConnection,
    component_id: ComponentId,
    exercises: &[ExerciseId],
) -> StoreResult<()> {
    sqlx::query("DELETE FROM component_exercises WHERE component_id = $1")
        .bind(component_id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("replace_component_exercises", e))?;

    for (position, exercise_id) in dedup_ids(exercises).into_iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO component_exercises (component_id, exercise_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(component_id.get())
        .bind(exercise_id.get())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("replace_component_exercises", e))?;
    }
    Ok(())
}

#[async_trait]
impl Repository<Component> for PgStore {
    type Draft = NewComponent;
    type Patch = ComponentPatch;

    #[instrument(skip(self, draft), fields(location_id = %draft.location_id), err)]
    async fn create(&self, draft: NewComponent) -> StoreResult<Component> {
        let mut tx = self.begin("create_component").await?;
        let ComponentRow(mut component) = sqlx::query_as::<_, ComponentRow>(
            r#"
            INSERT INTO components (location_id, name, description, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, location_id, name, description, image
            "#,
        )
        .bind(draft.location_id.get())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_component", e))?;

        replace_component_exercises(&mut tx, component.id, &draft.exercises).await?;
        commit(tx, "create_component").await?;

        component.exercises = dedup_ids(&draft.exercises);
        Ok(component)
    }

    #[instrument(skip(self), fields(component_id = %id), err)]
    async fn read(&self, id: ComponentId) -> StoreResult<Option<Component>> {
        let mut conn = self.acquire("read_component").await?;
        let row = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, location_id, name, description, image
            FROM components
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("read_component", e))?;

        match row {
            Some(row) => Ok(attach_component_exercises(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, patch), fields(component_id = %id), err)]
    async fn update(&self, id: ComponentId, patch: ComponentPatch) -> StoreResult<Option<Component>> {
        let mut tx = self.begin("update_component").await?;
        let row = sqlx::query_as::<_, ComponentRow>(
            r#"
            UPDATE components SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                image = COALESCE($4, image)
            WHERE id = $1
            RETURNING id, location_id, name, description, image
            "#,
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.image)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_component", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        if let Some(exercises) = &patch.exercises {
            replace_component_exercises(&mut tx, id, exercises).await?;
        }
        let component = attach_component_exercises(&mut tx, vec![row]).await?.pop();
        commit(tx, "update_component").await?;
        Ok(component)
    }

    #[instrument(skip(self), fields(component_id = %id), err)]
    async fn delete(&self, id: ComponentId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM components WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_component", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Component>> {
        let mut conn = self.acquire("list_components").await?;
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, location_id, name, description, image
            FROM components
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_components", e))?;
        attach_component_exercises(&mut conn, rows).await
    }
}

#[async_trait]
impl ComponentRepository for PgStore {
    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn list_by_location(&self, location_id: LocationId) -> StoreResult<Vec<Component>> {
        let mut conn = self.acquire("list_components_by_location").await?;
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, location_id, name, description, image
            FROM components
            WHERE location_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(location_id.get())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_components_by_location", e))?;
        attach_component_exercises(&mut conn, rows).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events + registrations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Event> for PgStore {
    type Draft = NewEvent;
    type Patch = EventPatch;

    #[instrument(skip(self, draft), fields(location_id = %draft.location_id), err)]
    async fn create(&self, draft: NewEvent) -> StoreResult<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (
                location_id,
                organisor_id,
                title,
                description,
                start_time,
                max_registrations,
                image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, location_id, organisor_id, title, description, start_time, max_registrations, image
            "#,
        )
        .bind(draft.location_id.get())
        .bind(draft.organisor_id.get())
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_time)
        .bind(draft.max_registrations)
        .bind(&draft.image)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_event", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn read(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, location_id, organisor_id, title, description, start_time, max_registrations, image
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_event", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, patch), fields(event_id = %id), err)]
    async fn update(&self, id: EventId, patch: EventPatch) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_time = COALESCE($4, start_time),
                max_registrations = COALESCE($5, max_registrations),
                image = COALESCE($6, image)
            WHERE id = $1
            RETURNING id, location_id, organisor_id, title, description, start_time, max_registrations, image
            "#,
        )
        .bind(id.get())
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.start_time)
        .bind(patch.max_registrations)
        .bind(patch.image)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_event", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn delete(&self, id: EventId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, location_id, organisor_id, title, description, start_time, max_registrations, image
            FROM events
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_events", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

#[async_trait]
impl EventRepository for PgStore {
    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn list_by_location(&self, location_id: LocationId) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, location_id, organisor_id, title, description, start_time, max_registrations, image
            FROM events
            WHERE location_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(location_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_events_by_location", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Locks the event row so concurrent registrations cannot overshoot the
    /// limit.
    #[instrument(
        skip(self),
        fields(event_id = %event_id, user_id = %user_id, registrations = tracing::field::Empty),
        err
    )]
    async fn create_registration(&self, event_id: EventId, user_id: UserId) -> StoreResult<RegisterOutcome> {
        let span = Span::current();
        let mut tx = self.begin("register").await?;

        let event = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, location_id, organisor_id, title, description, start_time, max_registrations, image
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(event_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("register", e))?;
        let Some(EventRow(event)) = event else {
            return Ok(RegisterOutcome::EventNotFound);
        };

        let already = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id.get())
        .bind(user_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("register", e))?;

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1",
        )
        .bind(event_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("register", e))?;
        span.record("registrations", count);

        if let Err(rejection) = event.check_registration(user_id, already, count as usize) {
            return Ok(RegisterOutcome::Rejected(rejection));
        }

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO registrations (event_id, user_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(event_id.get())
        .bind(user_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("register", e))?;
        commit(tx, "register").await?;

        Ok(RegisterOutcome::Registered(Registration {
            id: RegistrationId::new(id),
            event_id,
            user_id,
        }))
    }

    #[instrument(skip(self), fields(event_id = %event_id, user_id = %user_id), err)]
    async fn delete_registration(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM registrations WHERE event_id = $1 AND user_id = $2")
            .bind(event_id.get())
            .bind(user_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_registration", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(event_id = %event_id, user_id = %user_id), err)]
    async fn registration_exists(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id.get())
        .bind(user_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("registration_exists", e))
    }

    #[instrument(skip(self), fields(event_id = %event_id), err)]
    async fn count_registrations(&self, event_id: EventId) -> StoreResult<usize> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1",
        )
        .bind(event_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_registrations", e))?;
        Ok(count as usize)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn list_registered_events_for_user(&self, user_id: UserId) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT
                e.id,
                e.location_id,
                e.organisor_id,
                e.title,
                e.description,
                e.start_time,
                e.max_registrations,
                e.image
            FROM events e
            JOIN registrations r ON r.event_id = e.id
            WHERE r.user_id = $1
            ORDER BY r.id ASC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_registered_events", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
