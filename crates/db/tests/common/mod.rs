//! Shared fixtures for repository tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use coursepath_catalog::StaticCatalog;
use coursepath_core::catalog::Tier;
use coursepath_core::error::CoreError;
use coursepath_core::tier::SubscriptionProvider;
use coursepath_core::types::DbId;
use coursepath_core::xp::LinearLevelRule;
use coursepath_db::repositories::ProgressRepo;
use coursepath_db::store::{MemoryRecordStore, RecordStore};
use coursepath_db::subscriptions::RecordSubscriptions;

/// Every user is on the same tier.
pub struct FixedTier(pub Tier);

#[async_trait]
impl SubscriptionProvider for FixedTier {
    async fn current_tier(&self, _user_id: DbId) -> Result<Tier, CoreError> {
        Ok(self.0)
    }
}

pub fn seed_catalog() -> Arc<StaticCatalog> {
    Arc::new(StaticCatalog::seeded().expect("seed catalog is valid"))
}

/// A repo over `store` with the seed catalog, free tier for everyone.
pub fn repo_with_tier(store: Arc<dyn RecordStore>, tier: Tier) -> ProgressRepo {
    ProgressRepo::new(
        store,
        seed_catalog(),
        Arc::new(FixedTier(tier)),
        Arc::new(LinearLevelRule::default()),
    )
}

pub fn free_repo(store: Arc<dyn RecordStore>) -> ProgressRepo {
    repo_with_tier(store, Tier::Free)
}

/// A repo whose tier comes from each user's own record.
pub fn record_tier_repo(store: Arc<dyn RecordStore>) -> ProgressRepo {
    ProgressRepo::new(
        Arc::clone(&store),
        seed_catalog(),
        Arc::new(RecordSubscriptions::new(store)),
        Arc::new(LinearLevelRule::default()),
    )
}

pub fn memory_store() -> Arc<MemoryRecordStore> {
    Arc::new(MemoryRecordStore::new())
}
