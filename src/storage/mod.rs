//! Flow-record persistence
//!
//! Storage is write-only from the core's point of view: batches of records
//! are upserted per `(out_zone, in_zone, datetime_utc)` inside one
//! transaction, so a batch either lands completely or not at all, and
//! replaying a batch leaves the stored rows unchanged.

use crate::FlowRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

pub mod sqlite;

pub use sqlite::SqliteFlowStore;

/// Storage-layer errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database failure
    #[error("storage error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record failed integrity validation before hitting the database
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Upserts batches of flow records.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Upsert a batch atomically.
    ///
    /// Existing rows with the same `(out_zone, in_zone, datetime_utc)` key
    /// are overwritten; new rows are inserted. Returns the number of rows
    /// written. Any per-record failure rolls the whole batch back.
    async fn upsert_batch(&self, records: &[FlowRecord]) -> Result<u64, StorageError>;
}

type RecordKey = (String, String, DateTime<Utc>);

/// In-memory store, used by orchestration tests.
///
/// Mirrors the SQLite semantics: keyed overwrite, whole-batch atomicity
/// (validation runs before any row is touched).
#[derive(Debug, Default)]
pub struct MemoryFlowStore {
    rows: Mutex<BTreeMap<RecordKey, FlowRecord>>,
}

impl MemoryFlowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Snapshot of all records, ordered by key.
    pub async fn records(&self) -> Vec<FlowRecord> {
        self.rows.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn upsert_batch(&self, records: &[FlowRecord]) -> Result<u64, StorageError> {
        for record in records {
            record.validate().map_err(StorageError::InvalidRecord)?;
        }
        let mut rows = self.rows.lock().await;
        for record in records {
            let key = (
                record.out_zone.to_string(),
                record.in_zone.to_string(),
                record.datetime_utc,
            );
            rows.insert(key, record.clone());
        }
        Ok(records.len() as u64)
    }
}
