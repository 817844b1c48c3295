//! Postgres-backed store.
//!
//! Child collections (exercise steps, component exercise links, ...) live in
//! their own tables and are hydrated with one `= ANY($1)` query per
//! collection. Cascading deletes are declared in the schema
//! (`migrations/0001_init.sql`), except for rows keyed by user id, which are
//! removed explicitly when the user is deleted.
//!
//! ## Error Mapping
//!
//! | Postgres code | Meaning | `StoreError` |
//! |---------------|---------|--------------|
//! | 23505 | unique violation | `Conflict` |
//! | other | | `Database` |

use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::instrument;

use super::{StoreError, StoreResult};

mod accounts;
mod exercises;
mod locations;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `url`.
    #[instrument(skip(url), err)]
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations from `migrations/`.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Database {
                operation: "migrate",
                message: e.to_string(),
            })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self, operation: &'static str) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    async fn acquire(&self, operation: &'static str) -> StoreResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

async fn commit(tx: Transaction<'static, Postgres>, operation: &'static str) -> StoreResult<()> {
    tx.commit().await.map_err(|e| map_sqlx_error(operation, e))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict { operation, message },
                _ => StoreError::Database { operation, message },
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Corrupt {
            operation,
            message: err.to_string(),
        },
        _ => StoreError::Database {
            operation,
            message: err.to_string(),
        },
    }
}

fn corrupt(operation: &'static str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        operation,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_a_database_error() {
        let err = map_sqlx_error("read_location", sqlx::Error::RowNotFound);
        assert!(matches!(
            err,
            StoreError::Database { operation: "read_location", .. }
        ));
    }

    #[test]
    fn pool_closed_is_a_database_error() {
        let err = map_sqlx_error("list_events", sqlx::Error::PoolClosed);
        assert_eq!(
            err.to_string(),
            format!("database error in list_events: {}", sqlx::Error::PoolClosed)
        );
    }
}
