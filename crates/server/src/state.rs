use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use cascade::CascadeEngine;
use std::sync::Arc;
use store::{FeatureStore, MemoryStore};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Detection engine (shared across requests)
    pub engine: Arc<CascadeEngine>,
}

impl ServerState {
    /// Create new server state over an in-memory feature store.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store: Arc<dyn FeatureStore> = Arc::new(MemoryStore::new());
        Self::with_store(config, store)
    }

    /// Create new server state over a caller-provided store, for deployments
    /// that back the index with something other than process memory.
    pub fn with_store(config: ServerConfig, store: Arc<dyn FeatureStore>) -> ServerResult<Self> {
        let engine = CascadeEngine::with_local_analyzers(store, config.cascade.clone())
            .map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        })
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
