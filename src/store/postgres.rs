//! PostgreSQL implementation of the metadata store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{MetadataStore, ResourceRecord, StoreError, StoreFuture};
use crate::config::DatabaseConfig;
use crate::messages::JsonMap;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS resource_metadata (
    id          TEXT NOT NULL,
    type        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL,
    deleted_at  TIMESTAMPTZ,
    params      JSONB NOT NULL,
    data        JSONB NOT NULL,
    PRIMARY KEY (id)
)";

const SELECT_ACTIVE: &str = r"
SELECT id, type, created_at, updated_at, deleted_at, params, data
FROM resource_metadata
WHERE id = $1 AND deleted_at IS NULL";

const UPSERT: &str = r"
INSERT INTO resource_metadata (id, type, created_at, updated_at, deleted_at, params, data)
VALUES ($1, $2, $3, $4, NULL, $5, $6)
ON CONFLICT (id) DO UPDATE SET
    type = EXCLUDED.type,
    created_at = EXCLUDED.created_at,
    updated_at = EXCLUDED.updated_at,
    deleted_at = NULL,
    params = EXCLUDED.params,
    data = EXCLUDED.data";

const SOFT_DELETE: &str = r"
UPDATE resource_metadata
SET deleted_at = $2, updated_at = $2
WHERE id = $1 AND deleted_at IS NULL";

#[derive(Debug, FromRow)]
struct MetadataRow {
    id: String,
    #[sqlx(rename = "type")]
    resource_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    params: Json<JsonMap>,
    data: Json<JsonMap>,
}

impl From<MetadataRow> for ResourceRecord {
    fn from(row: MetadataRow) -> Self {
        Self {
            id: row.id,
            resource_type: row.resource_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            params: row.params.0,
            data: row.data.0,
        }
    }
}

/// Metadata store backed by the `resource_metadata` table.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects with exponential backoff and creates the table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when every connection attempt
    /// fails and [`StoreError::Database`] when the schema cannot be created.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!(host = %config.host, database = %config.name, "connecting to database");
        let pool = PgPoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(connect_options(config));
        let store = Self::from_pool(pool);
        store.wait_for_connection(config.connect_attempts).await?;
        store.initialise_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool without touching the database.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn wait_for_connection(&self, max_attempts: u32) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            match sqlx::query("SELECT 1").execute(&self.pool).await {
                Ok(_) => return Ok(()),
                Err(err) if attempt < max_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "cannot connect to database, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(StoreError::Unavailable {
                        attempts: attempt,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    async fn initialise_schema(&self) -> Result<(), StoreError> {
        info!("initialising database schema");
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(database_error("create resource_metadata table"))?;
        Ok(())
    }
}

impl MetadataStore for PostgresStore {
    fn find_active<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<ResourceRecord>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, MetadataRow>(SELECT_ACTIVE)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error("select resource_metadata"))?;
            Ok(row.map(ResourceRecord::from))
        })
    }

    fn upsert<'a>(&'a self, record: &'a ResourceRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            sqlx::query(UPSERT)
                .bind(&record.id)
                .bind(&record.resource_type)
                .bind(record.created_at)
                .bind(record.updated_at)
                .bind(Json(&record.params))
                .bind(Json(&record.data))
                .execute(&self.pool)
                .await
                .map_err(database_error("upsert resource_metadata"))?;
            Ok(())
        })
    }

    fn soft_delete<'a>(&'a self, id: &'a str, deleted_at: DateTime<Utc>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let result = sqlx::query(SOFT_DELETE)
                .bind(id)
                .bind(deleted_at)
                .execute(&self.pool)
                .await
                .map_err(database_error("soft delete resource_metadata"))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound { id: id.to_owned() });
            }
            Ok(())
        })
    }
}

/// Builds connection options from configuration. Sessions use UTC.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .username(&config.user)
        .database(&config.name)
        .ssl_mode(PgSslMode::Disable)
        .options([("timezone", "UTC")]);
    match config.password.as_deref() {
        Some(password) => options.password(password),
        None => options,
    }
}

/// Delay before the next connection attempt: `2^attempt` seconds.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1_u64.checked_shl(attempt).unwrap_or(u64::MAX))
}

fn database_error(action: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |err| {
        warn!(action, error = %err, "database error");
        StoreError::Database {
            action,
            message: err.to_string(),
        }
    }
}
