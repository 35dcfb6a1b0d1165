//! Server test utilities.

use shelf_core::config::AppConfig;
use shelf_server::{AppState, create_router};
use shelf_storage::{LocalBackend, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper backed by a temporary local tree.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary local storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after applying a config modifier.
    pub async fn with_config(modify: impl FnOnce(&mut AppConfig)) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let tree_path = temp_dir.path().join("tree");
        std::fs::create_dir_all(&tree_path).expect("Failed to create tree directory");
        let storage: Arc<dyn StorageBackend> = Arc::new(
            LocalBackend::new(&tree_path, "tree".to_string())
                .await
                .expect("Failed to create storage backend"),
        );

        let mut config = AppConfig::for_testing(tree_path);
        modify(&mut config);

        let state = AppState::new(config, storage);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Root directory of the served tree on the local filesystem.
    pub fn tree_path(&self) -> PathBuf {
        self._temp_dir.path().join("tree")
    }
}
