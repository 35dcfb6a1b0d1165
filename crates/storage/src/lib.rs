//! Storage abstraction and backends for Shelf.
//!
//! This crate provides:
//! - A file tree interface: listing, streaming reads, staged writes,
//!   directory and rename operations
//! - Logical path resolution with traversal protection
//! - Backends: local filesystem and SFTP network share

pub mod backends;
pub mod error;
pub mod resolve;
pub mod traits;

pub use backends::{local::LocalBackend, share::ShareBackend};
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, ScanEntry, StorageBackend, StorageBackendExt, WriteHandle};

use shelf_core::config::StorageConfig;
use std::sync::Arc;

/// Create a storage backend from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Local { path } => {
            let backend = LocalBackend::new(path, config.display_name()).await?;
            Ok(Arc::new(backend))
        }
        StorageConfig::Share {
            host,
            port,
            share,
            username,
            password,
        } => {
            let backend = ShareBackend::connect(
                host,
                *port,
                share,
                username,
                password,
                config.display_name(),
            )
            .await?;
            Ok(Arc::new(backend))
        }
    }
}
