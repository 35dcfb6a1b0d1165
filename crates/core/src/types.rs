//! Wire types for listings, uploads and server info.

use serde::{Deserialize, Serialize};

/// Metadata for one file in a directory listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name (final path component).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    ///
    /// Non-finite values serialize as JSON `null`.
    pub mtime: f64,
}

/// One directory level: immediate subdirectories and files, each sorted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// Subdirectory names.
    pub dirs: Vec<String>,
    /// Files with metadata.
    pub files: Vec<FileEntry>,
}

impl DirectoryListing {
    /// Build a listing with both sequences sorted case-insensitively by
    /// name. Names equal under case folding keep their byte order, so the
    /// result is deterministic regardless of enumeration order.
    pub fn sorted(mut dirs: Vec<String>, mut files: Vec<FileEntry>) -> Self {
        dirs.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        files.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        Self { dirs, files }
    }
}

/// Response for `GET /info`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Backend display name.
    pub name: String,
}

/// Response for `POST /upload`: the session cookie for subsequent chunks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadStarted {
    /// Upload session cookie.
    pub cookie: u64,
}

/// The empty `{}` success body shared by the mutating endpoints.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Empty {}
