//! Postgres-backed maintenance repository.
//!
//! ## Single active window
//!
//! A partial unique index on `enabled` (only over rows where it is `true`)
//! makes two simultaneously enabled rows impossible at the database level.
//! `start()` ends the active row and inserts the new one in one transaction,
//! so concurrent toggles from several processes serialize on that index.
//! Each process caches the switch in `MaintenanceState`; the API refreshes
//! that cache from `latest()` on an interval so toggles made elsewhere
//! propagate.
//!
//! ## Error Mapping
//!
//! Every SQLx error becomes `MaintenanceError::Store` with the failing
//! operation named; the in-memory switch is only published after commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use atelier_core::Username;
use atelier_maintenance::{MaintenanceError, MaintenanceRecord, MaintenanceRepository};

/// DDL for the maintenance history table. Idempotent.
pub const MAINTENANCE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS maintenance_windows (
    id          UUID PRIMARY KEY,
    enabled     BOOLEAN NOT NULL,
    message     TEXT NOT NULL,
    started_at  TIMESTAMPTZ NOT NULL,
    ended_at    TIMESTAMPTZ NULL,
    updated_at  TIMESTAMPTZ NOT NULL,
    created_by  TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS maintenance_windows_single_active
    ON maintenance_windows (enabled) WHERE enabled;
CREATE INDEX IF NOT EXISTS maintenance_windows_started_at
    ON maintenance_windows (started_at DESC);
"#;

#[derive(Debug, Clone)]
pub struct PostgresMaintenanceRepository {
    pool: Arc<PgPool>,
}

impl PostgresMaintenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the table and indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), MaintenanceError> {
        sqlx::raw_sql(MAINTENANCE_SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl MaintenanceRepository for PostgresMaintenanceRepository {
    #[instrument(skip(self))]
    async fn latest(&self) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        let row = sqlx::query(
            r#"
            SELECT id, enabled, message, started_at, ended_at, updated_at, created_by
            FROM maintenance_windows
            ORDER BY started_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest", e))?;

        row.map(|r| record_from_row(&r)).transpose()
    }

    #[instrument(skip(self, record), fields(window = %record.id))]
    async fn start(
        &self,
        record: MaintenanceRecord,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let ended = end_active_in(&mut tx, record.started_at).await?;

        sqlx::query(
            r#"
            INSERT INTO maintenance_windows (
                id, enabled, message, started_at, ended_at, updated_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.enabled)
        .bind(&record.message)
        .bind(record.started_at)
        .bind(record.ended_at)
        .bind(record.updated_at)
        .bind(record.created_by.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_window", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(ended)
    }

    #[instrument(skip(self))]
    async fn end_active(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let ended = end_active_in(&mut tx, at).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(ended)
    }
}

async fn end_active_in(
    tx: &mut Transaction<'_, Postgres>,
    at: DateTime<Utc>,
) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
    let row = sqlx::query(
        r#"
        UPDATE maintenance_windows
        SET enabled = FALSE, ended_at = $1, updated_at = $1
        WHERE enabled
        RETURNING id, enabled, message, started_at, ended_at, updated_at, created_by
        "#,
    )
    .bind(at)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("end_active", e))?;

    row.map(|r| record_from_row(&r)).transpose()
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<MaintenanceRecord, MaintenanceError> {
    let created_by: String = row
        .try_get("created_by")
        .map_err(|e| map_sqlx_error("decode_row", e))?;

    Ok(MaintenanceRecord {
        id: row.try_get("id").map_err(|e| map_sqlx_error("decode_row", e))?,
        enabled: row.try_get("enabled").map_err(|e| map_sqlx_error("decode_row", e))?,
        message: row.try_get("message").map_err(|e| map_sqlx_error("decode_row", e))?,
        started_at: row.try_get("started_at").map_err(|e| map_sqlx_error("decode_row", e))?,
        ended_at: row.try_get("ended_at").map_err(|e| map_sqlx_error("decode_row", e))?,
        updated_at: row.try_get("updated_at").map_err(|e| map_sqlx_error("decode_row", e))?,
        created_by: Username::parse(created_by)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> MaintenanceError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            if code == "23505" {
                // Lost a race against another process enabling maintenance.
                MaintenanceError::store(format!(
                    "concurrent maintenance toggle in {operation}: {}",
                    db_err.message()
                ))
            } else {
                MaintenanceError::store(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                ))
            }
        }
        sqlx::Error::PoolClosed => {
            MaintenanceError::store(format!("connection pool closed in {operation}"))
        }
        _ => MaintenanceError::store(format!("sqlx error in {operation}: {err}")),
    }
}
