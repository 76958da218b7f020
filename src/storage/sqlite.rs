//! SQLite flow store
//!
//! A single-writer pool in WAL mode; the schema is created on open. Upserts
//! run inside one transaction per batch, targeting the natural key
//! `(out_zone, in_zone, datetime_utc)`.

use crate::storage::{FlowStore, StorageError};
use crate::{FlowRecord, TimeWindow, Zone};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS physical_flow (
    out_zone     TEXT NOT NULL CHECK (length(out_zone) > 0),
    in_zone      TEXT NOT NULL CHECK (length(in_zone) > 0),
    datetime_utc TEXT NOT NULL,
    quantity_mw  REAL NOT NULL,
    resolution   TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (out_zone, in_zone, datetime_utc)
);
CREATE INDEX IF NOT EXISTS idx_physical_flow_time ON physical_flow (datetime_utc);
"#;

/// Flow store backed by a SQLite database file (or `:memory:`).
#[derive(Clone)]
pub struct SqliteFlowStore {
    pool: sqlx::SqlitePool,
}

impl SqliteFlowStore {
    /// Open (and create if missing) the database at `path`, apply pragmas,
    /// and ensure the schema exists.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(path)?
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        // One writer connection: SQLite serializes writes anyway, and a
        // single connection keeps `:memory:` databases alive for tests.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Open a fresh in-memory database.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(":memory:").await
    }

    /// Number of stored flow rows.
    pub async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM physical_flow")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }

    /// All stored records, ordered by key.
    pub async fn all_records(&self) -> Result<Vec<FlowRecord>, StorageError> {
        self.select_records(
            "SELECT out_zone, in_zone, datetime_utc, quantity_mw, resolution \
             FROM physical_flow ORDER BY out_zone, in_zone, datetime_utc",
            None,
        )
        .await
    }

    /// Stored records whose timestamp falls inside `window`, ordered by key.
    pub async fn records_in_window(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<FlowRecord>, StorageError> {
        self.select_records(
            "SELECT out_zone, in_zone, datetime_utc, quantity_mw, resolution \
             FROM physical_flow WHERE datetime_utc >= ?1 AND datetime_utc < ?2 \
             ORDER BY out_zone, in_zone, datetime_utc",
            Some(*window),
        )
        .await
    }

    async fn select_records(
        &self,
        sql: &str,
        window: Option<TimeWindow>,
    ) -> Result<Vec<FlowRecord>, StorageError> {
        let mut query = sqlx::query(sql);
        if let Some(window) = window {
            query = query.bind(window.start).bind(window.end);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| FlowRecord {
                out_zone: Zone::new(row.get::<String, _>("out_zone")),
                in_zone: Zone::new(row.get::<String, _>("in_zone")),
                datetime_utc: row.get::<DateTime<Utc>, _>("datetime_utc"),
                quantity_mw: row.get("quantity_mw"),
                resolution: row.get("resolution"),
            })
            .collect())
    }
}

#[async_trait]
impl FlowStore for SqliteFlowStore {
    async fn upsert_batch(&self, records: &[FlowRecord]) -> Result<u64, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for record in records {
            // Validate before touching the row; an error here (or from the
            // database) drops the transaction and rolls the batch back.
            record.validate().map_err(StorageError::InvalidRecord)?;
            let result = sqlx::query(
                "INSERT INTO physical_flow (out_zone, in_zone, datetime_utc, quantity_mw, resolution) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT (out_zone, in_zone, datetime_utc) \
                 DO UPDATE SET quantity_mw = excluded.quantity_mw, resolution = excluded.resolution",
            )
            .bind(record.out_zone.as_str())
            .bind(record.in_zone.as_str())
            .bind(record.datetime_utc)
            .bind(record.quantity_mw)
            .bind(&record.resolution)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        Ok(written)
    }
}
