//! Application state shared across handlers.

use crate::uploads::UploadRegistry;
use shelf_core::config::AppConfig;
use shelf_storage::StorageBackend;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Storage backend.
    pub storage: Arc<dyn StorageBackend>,
    /// Live upload sessions.
    pub uploads: Arc<UploadRegistry>,
}

impl AppState {
    /// Create a new application state. The configuration is expected to be
    /// validated already.
    pub fn new(config: AppConfig, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            uploads: Arc::new(UploadRegistry::new()),
        }
    }
}
