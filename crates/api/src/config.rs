use std::path::PathBuf;

use coursepath_core::xp::DEFAULT_XP_PER_LEVEL;

use crate::auth::jwt::JwtConfig;

/// Which [`RecordStore`](coursepath_db::store::RecordStore) backs profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStoreKind {
    Postgres,
    Memory,
}

impl RecordStoreKind {
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "postgres" => Some(Self::Postgres),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Where course definitions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// The catalog compiled into the binary.
    Seed,
    /// A JSON catalog document on disk.
    File(PathBuf),
    /// A hosted catalog service.
    Http(String),
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to drain after the listener stops.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub record_store: RecordStoreKind,
    /// Required when `record_store` is [`RecordStoreKind::Postgres`].
    pub database_url: Option<String>,
    pub catalog: CatalogSource,
    /// Width of one level for the linear level rule.
    pub xp_per_level: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `RECORD_STORE`         | `postgres`                 |
    /// | `DATABASE_URL`         | -- (required for postgres) |
    /// | `CATALOG_URL`          | -- (hosted catalog)        |
    /// | `CATALOG_PATH`         | -- (catalog JSON file)     |
    /// | `XP_PER_LEVEL`         | `1000`                     |
    ///
    /// `CATALOG_URL` wins over `CATALOG_PATH`; with neither set the built-in
    /// seed catalog is served.
    ///
    /// # Panics
    ///
    /// Panics on any malformed value, or when `DATABASE_URL` is missing for
    /// the postgres store.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let store_name = std::env::var("RECORD_STORE").unwrap_or_else(|_| "postgres".into());
        let record_store = RecordStoreKind::from_str_value(&store_name).unwrap_or_else(|| {
            panic!("RECORD_STORE must be 'postgres' or 'memory', got '{store_name}'")
        });

        let database_url = std::env::var("DATABASE_URL").ok();
        if record_store == RecordStoreKind::Postgres {
            assert!(
                database_url.is_some(),
                "DATABASE_URL must be set when RECORD_STORE=postgres"
            );
        }

        let catalog = match (std::env::var("CATALOG_URL"), std::env::var("CATALOG_PATH")) {
            (Ok(url), _) if !url.is_empty() => CatalogSource::Http(url),
            (_, Ok(path)) if !path.is_empty() => CatalogSource::File(PathBuf::from(path)),
            _ => CatalogSource::Seed,
        };

        let xp_per_level: i64 = std::env::var("XP_PER_LEVEL")
            .unwrap_or_else(|_| DEFAULT_XP_PER_LEVEL.to_string())
            .parse()
            .expect("XP_PER_LEVEL must be a valid i64");
        assert!(xp_per_level > 0, "XP_PER_LEVEL must be positive");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            record_store,
            database_url,
            catalog,
            xp_per_level,
        }
    }
}
