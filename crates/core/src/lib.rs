//! Core domain types and shared configuration for the shelf file server.
//!
//! This crate defines the data model used across all other crates:
//! - Application, server and storage-backend configuration
//! - Directory listing and file metadata wire types
//! - Upload protocol wire types

pub mod config;
pub mod types;

pub use config::{AppConfig, ServerConfig, StorageConfig};
pub use types::{DirectoryListing, Empty, FileEntry, InfoResponse, UploadStarted};

/// Download read chunk size: 1 MiB.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Default cap on a single uploaded chunk body: 64 MiB.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 64 * 1024 * 1024;
