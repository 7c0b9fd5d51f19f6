//! Application configuration loaded from environment variables.

use std::time::Duration;

use axum::http::HeaderValue;
use beacon_core::SchemaProfile;

/// Landing page used when a click request is missing its parameters.
pub const DEFAULT_FALLBACK_URL: &str = "https://bluegreen.ai";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8082").
    pub bind_addr: String,

    /// Postgres connection URL.
    pub database_url: String,

    /// Landing page for click requests with missing/unusable parameters.
    pub fallback_url: String,

    /// Datastore naming profile (legacy or mailmeteor).
    pub schema: SchemaProfile,

    /// Upper bound on each datastore round-trip. A call that exceeds it
    /// is treated as failed and the response falls through regardless.
    pub store_timeout: Duration,

    /// Maximum Postgres pool connections.
    pub pg_max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `DATABASE_URL`: Postgres connection URL
    ///
    /// Optional environment variables:
    /// - `BEACON_BIND_ADDR`: Server bind address (default: "0.0.0.0:8082")
    /// - `BEACON_FALLBACK_URL`: Fallback landing page (default: "https://bluegreen.ai")
    /// - `BEACON_SCHEMA`: "legacy" or "mailmeteor" (default: "legacy")
    /// - `BEACON_STORE_TIMEOUT_MS`: Datastore call timeout (default: 3000)
    /// - `BEACON_PG_MAX_CONNECTIONS`: Pool size (default: 5)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("BEACON_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8082".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let fallback_url = std::env::var("BEACON_FALLBACK_URL")
            .unwrap_or_else(|_| DEFAULT_FALLBACK_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        // The fallback URL ends up in a Location header on every bad
        // request, so reject values that can never form one.
        if fallback_url.is_empty() || HeaderValue::from_str(&fallback_url).is_err() {
            anyhow::bail!("BEACON_FALLBACK_URL is not a usable redirect target");
        }

        let schema = std::env::var("BEACON_SCHEMA")
            .unwrap_or_else(|_| "legacy".to_string())
            .parse::<SchemaProfile>()?;

        let store_timeout_ms: u64 = std::env::var("BEACON_STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("BEACON_STORE_TIMEOUT_MS must be an integer: {e}"))?;

        let pg_max_connections: u32 = std::env::var("BEACON_PG_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("BEACON_PG_MAX_CONNECTIONS must be an integer: {e}"))?;

        tracing::info!(
            bind_addr = %bind_addr,
            fallback_url = %fallback_url,
            schema = ?schema,
            store_timeout_ms,
            pg_max_connections,
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            database_url,
            fallback_url,
            schema,
            store_timeout: Duration::from_millis(store_timeout_ms),
            pg_max_connections,
        })
    }
}
