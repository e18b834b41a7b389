use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursepath_api::config::{CatalogSource, RecordStoreKind, ServerConfig};
use coursepath_api::router::build_app_router;
use coursepath_api::state::AppState;
use coursepath_catalog::{HttpCatalog, StaticCatalog};
use coursepath_core::catalog::CatalogProvider;
use coursepath_db::store::{MemoryRecordStore, PgRecordStore, RecordStore};
use coursepath_events::{EventBus, EventLogger};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "coursepath_api=debug,coursepath_db=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Record store ---
    let store = build_record_store(&config).await;

    // --- Catalog ---
    let catalog = build_catalog(&config);

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe()));
    tracing::info!("Event bus created");

    // --- App state & router ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(config, store, catalog, Arc::clone(&event_bus));
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last sender closes the channel and stops the logger.
    drop(event_bus);
    match tokio::time::timeout(shutdown_timeout, logger_handle).await {
        Ok(Ok(logged)) => tracing::info!(logged, "Event logger stopped"),
        _ => tracing::warn!("Event logger did not stop in time"),
    }

    tracing::info!("Graceful shutdown complete");
}

async fn build_record_store(config: &ServerConfig) -> Arc<dyn RecordStore> {
    match config.record_store {
        RecordStoreKind::Memory => {
            tracing::warn!("Using in-memory record store; profiles are lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
        RecordStoreKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set");

            let pool = coursepath_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            coursepath_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            coursepath_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgRecordStore::new(pool))
        }
    }
}

fn build_catalog(config: &ServerConfig) -> Arc<dyn CatalogProvider> {
    match &config.catalog {
        CatalogSource::Seed => {
            let catalog = StaticCatalog::seeded().expect("Built-in catalog is invalid");
            let ids: Vec<&str> = catalog.course_ids().collect();
            tracing::info!(courses = catalog.len(), ?ids, "Serving built-in catalog");
            Arc::new(catalog)
        }
        CatalogSource::File(path) => {
            let catalog = StaticCatalog::from_file(path)
                .unwrap_or_else(|e| panic!("Failed to load catalog {}: {e}", path.display()));
            tracing::info!(courses = catalog.len(), path = %path.display(), "Loaded catalog file");
            Arc::new(catalog)
        }
        CatalogSource::Http(url) => {
            tracing::info!(%url, "Using hosted catalog");
            Arc::new(HttpCatalog::new(url.clone()))
        }
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
