//! [`RecordStore`] over the `user_records` table.
//!
//! The version check and the write happen in one statement, so two writers
//! that read the same version cannot both succeed.

use async_trait::async_trait;
use sqlx::types::Json;

use super::{RecordStore, StoreError, VersionedRecord, NEW_RECORD_VERSION};
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Version currently stored at `key`, or `0` when absent. Only used to
    /// describe a refused write.
    async fn current_version(&self, key: &str) -> Result<i64, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM user_records WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map_or(NEW_RECORD_VERSION, |(v,)| v))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedRecord>, StoreError> {
        let row: Option<(Json<serde_json::Value>, i64)> =
            sqlx::query_as("SELECT body, version FROM user_records WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(body), version)| VersionedRecord { body, version }))
    }

    async fn put(
        &self,
        key: &str,
        body: serde_json::Value,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let written: Option<(i64,)> = if expected_version == NEW_RECORD_VERSION {
            sqlx::query_as(
                "INSERT INTO user_records (key, body, version) \
                 VALUES ($1, $2, 1) \
                 ON CONFLICT (key) DO NOTHING \
                 RETURNING version",
            )
            .bind(key)
            .bind(Json(&body))
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "UPDATE user_records \
                 SET body = $2, version = version + 1, updated_at = now() \
                 WHERE key = $1 AND version = $3 \
                 RETURNING version",
            )
            .bind(key)
            .bind(Json(&body))
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?
        };

        match written {
            Some((version,)) => Ok(version),
            None => Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found: self.current_version(key).await?,
            }),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
