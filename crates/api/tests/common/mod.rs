//! Shared harness for HTTP-level tests: the production router over an
//! in-memory record store and the seed catalog.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use coursepath_api::auth::jwt::{generate_access_token, JwtConfig};
use coursepath_api::config::{CatalogSource, RecordStoreKind, ServerConfig};
use coursepath_api::router::build_app_router;
use coursepath_api::state::AppState;
use coursepath_catalog::StaticCatalog;
use coursepath_core::types::DbId;
use coursepath_db::store::MemoryRecordStore;
use coursepath_events::EventBus;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        record_store: RecordStoreKind::Memory,
        database_url: None,
        catalog: CatalogSource::Seed,
        xp_per_level: 1000,
    }
}

/// Everything a test may want to inspect behind the router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryRecordStore>,
    pub event_bus: Arc<EventBus>,
}

pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryRecordStore::new());
    let catalog = Arc::new(StaticCatalog::seeded().expect("seed catalog is valid"));
    let event_bus = Arc::new(EventBus::default());
    let state = AppState::new(
        test_config(),
        store.clone(),
        catalog,
        Arc::clone(&event_bus),
    );
    TestApp {
        router: build_app_router(state),
        store,
        event_bus,
    }
}

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_raw_auth(app: &Router, uri: &str, token: &str, body: &'static str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
