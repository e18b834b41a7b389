use std::sync::Arc;

use coursepath_core::catalog::CatalogProvider;
use coursepath_core::xp::LinearLevelRule;
use coursepath_db::repositories::ProgressRepo;
use coursepath_db::store::RecordStore;
use coursepath_db::subscriptions::RecordSubscriptions;
use coursepath_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Enroll / complete / read operations on user profiles.
    pub progress: Arc<ProgressRepo>,
    /// The record store under `progress`, for health checks.
    pub store: Arc<dyn RecordStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing progression events.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the progress repository from its collaborators. The user's tier
    /// is read from their own profile record.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn CatalogProvider>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let progress = ProgressRepo::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            Arc::new(RecordSubscriptions::new(Arc::clone(&store))),
            Arc::new(LinearLevelRule {
                xp_per_level: config.xp_per_level,
            }),
        );
        Self {
            progress: Arc::new(progress),
            store,
            catalog,
            config: Arc::new(config),
            event_bus,
        }
    }
}
