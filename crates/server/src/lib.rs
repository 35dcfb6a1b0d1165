//! HTTP API server for the Shelf file tree.
//!
//! This crate provides the HTTP surface:
//! - Directory listing and backend info
//! - Chunked, resumable uploads with session cookies
//! - Chunked download streaming
//! - Tree management (mkdir, rename, delete, recursive rmdir)

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod uploads;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use uploads::{UploadError, UploadRegistry};
