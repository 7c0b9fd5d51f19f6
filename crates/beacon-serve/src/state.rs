//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::store::{PgTrackingStore, TrackingStore};

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Datastore the pipeline records into.
    pub store: Arc<dyn TrackingStore>,

    /// Application configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// The Postgres pool connects lazily, so startup does not depend on
    /// the database being reachable.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = PgTrackingStore::connect_lazy(
            &config.database_url,
            config.pg_max_connections,
            config.schema,
        )?;

        tracing::info!(
            schema = ?config.schema,
            pg_max_connections = config.pg_max_connections,
            "application state initialized"
        );

        Ok(Self {
            store: Arc::new(store),
            config: Arc::new(config),
        })
    }

    /// State backed by an arbitrary store, for handler tests.
    #[cfg(test)]
    pub(crate) fn with_store(config: Config, store: Arc<dyn TrackingStore>) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
