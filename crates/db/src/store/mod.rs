//! Whole-record key/blob store with a version token.
//!
//! A record is read as a whole and written as a whole. Every `put` names the
//! version it read; the write is refused when another writer got there
//! first. Version `0` stands for "no record yet".

use async_trait::async_trait;
use coursepath_core::error::CoreError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Version passed to [`RecordStore::put`] when creating a record.
pub const NEW_RECORD_VERSION: i64 = 0;

/// A stored blob together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRecord {
    pub body: serde_json::Value,
    pub version: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record changed (or appeared) since it was read.
    #[error("Version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: i64,
        found: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { key, .. } => CoreError::StaleRecord { key },
            StoreError::Database(e) => CoreError::Storage(e.to_string()),
            StoreError::Unavailable(msg) => CoreError::Storage(msg),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, StoreError>;

    /// Replace the whole record at `key` and return the new version.
    ///
    /// Fails with [`StoreError::VersionConflict`] unless the stored version
    /// equals `expected_version` (or, for [`NEW_RECORD_VERSION`], no record
    /// exists).
    async fn put(
        &self,
        key: &str,
        body: serde_json::Value,
        expected_version: i64,
    ) -> Result<i64, StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
