//! Users, beacons and beacon scan logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tracing::instrument;

use skillsgarden_auth::{Gender, NewUser, Role, User, UserPatch, normalize_email};
use skillsgarden_beacons::{Beacon, BeaconLog, BeaconPatch, NewBeacon, NewBeaconLog};
use skillsgarden_core::{BeaconId, BeaconLogId, LocationId, UserId};

use super::{PgStore, commit, corrupt, map_sqlx_error};
use crate::repository::{BeaconRepository, Repository, StoreResult, UserRepository};

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    date_of_birth: Option<DateTime<Utc>>,
    gender: Option<String>,
    role: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            date_of_birth: row.try_get("date_of_birth")?,
            gender: row.try_get("gender")?,
            role: row.try_get("role")?,
        })
    }
}

impl UserRow {
    fn into_user(self, operation: &'static str) -> StoreResult<User> {
        let gender = self
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|e| corrupt(operation, e))?;
        let role = self.role.parse::<Role>().map_err(|e| corrupt(operation, e))?;
        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            date_of_birth: self.date_of_birth,
            gender,
            role,
        })
    }
}

struct BeaconRow(Beacon);

impl<'r> FromRow<'r, PgRow> for BeaconRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let location_id: Option<i32> = row.try_get("location_id")?;
        Ok(BeaconRow(Beacon {
            id: BeaconId::new(row.try_get("id")?),
            location_id: location_id.map(LocationId::new),
            name: row.try_get("name")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
        }))
    }
}

struct BeaconLogRow(BeaconLog);

impl<'r> FromRow<'r, PgRow> for BeaconLogRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BeaconLogRow(BeaconLog {
            id: BeaconLogId::new(row.try_get("id")?),
            beacon_id: BeaconId::new(row.try_get("beacon_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            timestamp: row.try_get("timestamp")?,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<User> for PgStore {
    type Draft = NewUser;
    type Patch = UserPatch;

    /// A duplicate email surfaces as `StoreError::Conflict`.
    #[instrument(skip(self, draft), fields(role = %draft.role), err)]
    async fn create(&self, draft: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, password_hash, date_of_birth, gender, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, date_of_birth, gender, role
            "#,
        )
        .bind(&draft.name)
        .bind(normalize_email(&draft.email))
        .bind(&draft.password_hash)
        .bind(draft.date_of_birth)
        .bind(draft.gender.as_str())
        .bind(draft.role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        row.into_user("create_user")
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn read(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, date_of_birth, gender, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_user", e))?;
        row.map(|r| r.into_user("read_user")).transpose()
    }

    #[instrument(skip(self, patch), fields(user_id = %id), err)]
    async fn update(&self, id: UserId, patch: UserPatch) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                date_of_birth = COALESCE($5, date_of_birth),
                gender = COALESCE($6, gender),
                role = COALESCE($7, role)
            WHERE id = $1
            RETURNING id, name, email, password_hash, date_of_birth, gender, role
            "#,
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.email.as_deref().map(normalize_email))
        .bind(patch.password_hash)
        .bind(patch.date_of_birth)
        .bind(patch.gender.map(|g| g.as_str()))
        .bind(patch.role.map(|r| r.as_str()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        row.map(|r| r.into_user("update_user")).transpose()
    }

    /// Removes the user's registrations and scan logs in the same transaction.
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> StoreResult<bool> {
        let mut tx = self.begin("delete_user").await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        for statement in [
            "DELETE FROM registrations WHERE user_id = $1",
            "DELETE FROM beacon_logs WHERE user_id = $1",
        ] {
            sqlx::query(statement)
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_user", e))?;
        }
        commit(tx, "delete_user").await?;
        Ok(true)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, date_of_birth, gender, role
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.into_iter().map(|r| r.into_user("list_users")).collect()
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, date_of_birth, gender, role
            FROM users
            WHERE lower(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.map(|r| r.into_user("find_user_by_email")).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Beacons
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Beacon> for PgStore {
    type Draft = NewBeacon;
    type Patch = BeaconPatch;

    #[instrument(skip(self, draft), fields(location_id = %draft.location_id), err)]
    async fn create(&self, draft: NewBeacon) -> StoreResult<Beacon> {
        let row = sqlx::query_as::<_, BeaconRow>(
            r#"
            INSERT INTO beacons (location_id, name, lat, lng)
            VALUES ($1, $2, $3, $4)
            RETURNING id, location_id, name, lat, lng
            "#,
        )
        .bind(draft.location_id.get())
        .bind(&draft.name)
        .bind(draft.lat)
        .bind(draft.lng)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_beacon", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(beacon_id = %id), err)]
    async fn read(&self, id: BeaconId) -> StoreResult<Option<Beacon>> {
        let row = sqlx::query_as::<_, BeaconRow>(
            "SELECT id, location_id, name, lat, lng FROM beacons WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("read_beacon", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, patch), fields(beacon_id = %id), err)]
    async fn update(&self, id: BeaconId, patch: BeaconPatch) -> StoreResult<Option<Beacon>> {
        let row = sqlx::query_as::<_, BeaconRow>(
            r#"
            UPDATE beacons SET
                location_id = COALESCE($2, location_id),
                name = COALESCE($3, name),
                lat = COALESCE($4, lat),
                lng = COALESCE($5, lng)
            WHERE id = $1
            RETURNING id, location_id, name, lat, lng
            "#,
        )
        .bind(id.get())
        .bind(patch.location_id.map(LocationId::get))
        .bind(patch.name)
        .bind(patch.lat)
        .bind(patch.lng)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_beacon", e))?;
        Ok(row.map(|r| r.0))
    }

    /// Scan logs cascade.
    #[instrument(skip(self), fields(beacon_id = %id), err)]
    async fn delete(&self, id: BeaconId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM beacons WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_beacon", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Beacon>> {
        let rows = sqlx::query_as::<_, BeaconRow>(
            "SELECT id, location_id, name, lat, lng FROM beacons ORDER BY id ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_beacons", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

#[async_trait]
impl BeaconRepository for PgStore {
    #[instrument(skip(self, log), fields(beacon_id = %log.beacon_id, user_id = %log.user_id), err)]
    async fn log_user(&self, log: NewBeaconLog) -> StoreResult<BeaconLog> {
        let row = sqlx::query_as::<_, BeaconLogRow>(
            r#"
            INSERT INTO beacon_logs (beacon_id, user_id, timestamp)
            VALUES ($1, $2, $3)
            RETURNING id, beacon_id, user_id, timestamp
            "#,
        )
        .bind(log.beacon_id.get())
        .bind(log.user_id.get())
        .bind(log.timestamp)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("log_user", e))?;
        Ok(row.0)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn list_logs_by_user(&self, user_id: UserId) -> StoreResult<Vec<BeaconLog>> {
        let rows = sqlx::query_as::<_, BeaconLogRow>(
            r#"
            SELECT id, beacon_id, user_id, timestamp
            FROM beacon_logs
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_logs_by_user", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn delete_logs_by_user(&self, user_id: UserId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM beacon_logs WHERE user_id = $1")
            .bind(user_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_logs_by_user", e))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StoreError;

    fn row(gender: Option<&str>, role: &str) -> UserRow {
        UserRow {
            id: 7,
            name: "Pete".into(),
            email: "pete@mail.com".into(),
            password_hash: "hash".into(),
            date_of_birth: None,
            gender: gender.map(str::to_string),
            role: role.into(),
        }
    }

    #[test]
    fn user_row_parses_enum_columns() {
        let user = row(Some("Female"), "Organiser").into_user("read_user").unwrap();
        assert_eq!(user.gender, Some(Gender::Female));
        assert_eq!(user.role, Role::Organiser);
        assert_eq!(user.id, UserId::new(7));
    }

    #[test]
    fn unknown_role_is_corrupt() {
        let err = row(None, "Root").into_user("read_user").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { operation: "read_user", .. }));
    }
}
