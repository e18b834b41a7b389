//! Persistence for the course progression engine.
//!
//! The only storage primitive is a versioned whole-record get/put
//! ([`store::RecordStore`]); [`repositories::ProgressRepo`] builds the
//! Enroll and CompleteLesson operations on top of it.

use sqlx::postgres::PgPoolOptions;

pub mod locks;
pub mod repositories;
pub mod store;
pub mod subscriptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
