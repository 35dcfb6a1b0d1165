//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5210").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum size in bytes of a single uploaded chunk body.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: u64,
}

fn default_bind() -> String {
    "0.0.0.0:5210".to_string()
}

fn default_max_chunk_size() -> u64 {
    crate::DEFAULT_MAX_CHUNK_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_chunk_size: default_max_chunk_size(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.bind.is_empty() {
            return Err("server.bind must not be empty".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("server.max_chunk_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem directory.
    Local {
        /// Base directory; every logical path resolves underneath it.
        path: PathBuf,
    },
    /// SFTP network share.
    Share {
        /// Remote host name or address.
        host: String,
        /// Remote SSH port.
        #[serde(default = "default_share_port")]
        port: u16,
        /// Share name: the top-level remote directory exposed by this server.
        share: String,
        /// Username for password authentication.
        username: String,
        /// Password for password authentication.
        /// WARNING: Prefer the SHELF_STORAGE__PASSWORD env var over storing
        /// secrets in config files.
        password: String,
    },
}

fn default_share_port() -> u16 {
    22
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            path: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Local { path } => {
                if path.as_os_str().is_empty() {
                    return Err("local storage requires a non-empty 'path'".to_string());
                }
                Ok(())
            }
            StorageConfig::Share {
                host,
                share,
                username,
                ..
            } => {
                if host.is_empty() {
                    return Err("share storage requires a non-empty 'host'".to_string());
                }
                if share.is_empty() {
                    return Err("share storage requires a non-empty 'share'".to_string());
                }
                if username.is_empty() {
                    return Err("share storage requires a non-empty 'username'".to_string());
                }
                Ok(())
            }
        }
    }

    /// The name shown to clients for this backend: the base directory's
    /// final component for local storage, the share name for a share.
    pub fn display_name(&self) -> String {
        match self {
            StorageConfig::Local { path } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            StorageConfig::Share { share, .. } => share.clone(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.storage.validate()
    }

    /// Create a test configuration over a local directory, bound to an
    /// ephemeral port.
    ///
    /// **For testing only.**
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                max_chunk_size: default_max_chunk_size(),
            },
            storage: StorageConfig::Local { path: path.into() },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
