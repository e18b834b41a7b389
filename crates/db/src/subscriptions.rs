//! Subscription tier read from the user's own profile record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use coursepath_core::catalog::Tier;
use coursepath_core::error::CoreError;
use coursepath_core::profile::{record_key, UserProfile};
use coursepath_core::tier::SubscriptionProvider;
use coursepath_core::types::DbId;

use crate::store::RecordStore;

/// Reads `subscriptionTier` from the profile record. Users without a record
/// are on the free tier.
pub struct RecordSubscriptions {
    store: Arc<dyn RecordStore>,
}

impl RecordSubscriptions {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SubscriptionProvider for RecordSubscriptions {
    async fn current_tier(&self, user_id: DbId) -> Result<Tier, CoreError> {
        match self.store.get(&record_key(user_id)).await? {
            None => Ok(Tier::Free),
            Some(record) => {
                Ok(UserProfile::from_record(user_id, record.body, Utc::now())?.subscription_tier)
            }
        }
    }
}
