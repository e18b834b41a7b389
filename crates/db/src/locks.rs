//! Per-user serialization of profile mutations.
//!
//! Every read-modify-write on a user's record runs while holding that user's
//! lock, so two requests in this process can never interleave their read
//! and write. Requests for different users do not contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use coursepath_core::types::DbId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Map of per-user async mutexes. Entries nobody holds or waits on are
/// pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<DbId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s record.
    pub async fn acquire(&self, user_id: DbId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            // Only the map holds an idle entry.
            map.retain(|id, l| *id == user_id || Arc::strong_count(l) > 1);
            Arc::clone(map.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of users with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
