//! In-process [`RecordStore`] with the same version semantics as Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordStore, StoreError, VersionedRecord, NEW_RECORD_VERSION};

/// Records live in a map behind an async `RwLock`; writes compare and swap
/// the version under the write lock.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, VersionedRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record unconditionally. Used to seed fixtures and legacy
    /// shapes in tests.
    pub async fn insert_raw(&self, key: &str, body: serde_json::Value) -> i64 {
        let mut records = self.records.write().await;
        let version = records.get(key).map_or(0, |r| r.version) + 1;
        records.insert(key.to_string(), VersionedRecord { body, version });
        version
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        body: serde_json::Value,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let mut records = self.records.write().await;
        let found = records.get(key).map_or(NEW_RECORD_VERSION, |r| r.version);
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found,
            });
        }
        let version = found + 1;
        records.insert(key.to_string(), VersionedRecord { body, version });
        Ok(version)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemoryRecordStore::new();
        assert!(store.get("user:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_then_update_bumps_version() {
        let store = MemoryRecordStore::new();
        let v1 = store.put("user:1", json!({"xp": 0}), 0).await.unwrap();
        assert_eq!(v1, 1);
        let v2 = store.put("user:1", json!({"xp": 50}), v1).await.unwrap();
        assert_eq!(v2, 2);
        let record = store.get("user:1").await.unwrap().unwrap();
        assert_eq!(record.body["xp"], 50);
        assert_eq!(record.version, 2);
    }

    #[tokio::test]
    async fn stale_write_is_refused_and_leaves_record_untouched() {
        let store = MemoryRecordStore::new();
        store.put("user:1", json!({"xp": 0}), 0).await.unwrap();
        store.put("user:1", json!({"xp": 100}), 1).await.unwrap();

        let err = store.put("user:1", json!({"xp": 50}), 1).await.unwrap_err();
        assert_matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                found: 2,
                ..
            }
        );
        assert_eq!(store.get("user:1").await.unwrap().unwrap().body["xp"], 100);
    }

    #[tokio::test]
    async fn create_over_existing_record_conflicts() {
        let store = MemoryRecordStore::new();
        store.insert_raw("user:1", json!({})).await;
        assert_matches!(
            store.put("user:1", json!({}), 0).await,
            Err(StoreError::VersionConflict { found: 1, .. })
        );
    }
}
