//! Shared application state for all routes.

use crate::config::{AppConfig, Environment};
use crate::store::{DocumentStore, InMemoryDocumentStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub environment: Environment,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        AppState {
            store,
            environment: config.environment,
            body_limit_bytes: config.body_limit_bytes,
        }
    }

    /// Empty in-memory store with default settings for the given environment.
    pub fn in_memory(environment: Environment) -> Self {
        let config = AppConfig {
            environment,
            ..AppConfig::default()
        };
        AppState::new(Arc::new(InMemoryDocumentStore::new()), &config)
    }
}
