//! Storage trait definitions.

use crate::error::StorageResult;
use crate::resolve::join_logical;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use shelf_core::types::{DirectoryListing, FileEntry};
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// One entry from scanning a directory.
#[derive(Clone, Debug)]
pub struct ScanEntry {
    /// Entry name (final path component).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// File size in bytes (0 for directories).
    pub size: u64,
    /// Modification time, seconds since the Unix epoch (0 for directories).
    pub mtime: f64,
}

/// File tree abstraction over a local directory or a network share.
///
/// Paths are logical: relative to the backend root, `/`-separated. Every
/// operation validates its path(s) through [`crate::resolve`] before
/// touching the backend.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Enumerate the immediate children of a directory (not recursive).
    async fn scan(&self, path: &str) -> StorageResult<Vec<ScanEntry>>;

    /// Open a file for reading as a stream of bounded-size chunks.
    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream>;

    /// Open a file for writing. Bytes are staged next to the destination
    /// and only moved into place when the handle is finished.
    async fn open_write(&self, path: &str) -> StorageResult<Box<dyn WriteHandle>>;

    /// Create a directory. The parent must already exist.
    async fn make_dir(&self, path: &str) -> StorageResult<()>;

    /// Remove an empty directory.
    async fn remove_dir(&self, path: &str) -> StorageResult<()>;

    /// Remove a file.
    async fn remove_file(&self, path: &str) -> StorageResult<()>;

    /// Rename a file or directory.
    async fn rename(&self, source: &str, dest: &str) -> StorageResult<()>;

    /// The name shown to clients for this backend.
    fn display_name(&self) -> &str;

    /// Verify the backend is reachable.
    ///
    /// Called during server startup to ensure storage is available before
    /// accepting requests. The default implementation returns Ok(()).
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Trait for staged writes.
///
/// A handle is owned by exactly one upload session and sees a strictly
/// sequential write/finish/abort call pattern.
#[async_trait]
pub trait WriteHandle: Send {
    /// Append a chunk of data to the staged file.
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Flush the staged file and move it into place.
    /// Returns the total bytes written.
    async fn finish(self: Box<Self>) -> StorageResult<u64>;

    /// Abort the write, removing the staged file. The destination is left
    /// untouched.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}

/// Listing and subtree-removal operations built on [`StorageBackend`]
/// primitives.
///
/// Automatically implemented for every backend via the blanket impl below;
/// do not implement manually.
#[async_trait]
pub trait StorageBackendExt: StorageBackend {
    /// List one directory level, partitioned into directories and files,
    /// each sorted case-insensitively by name.
    async fn list(&self, path: &str) -> StorageResult<DirectoryListing> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in self.scan(path).await? {
            if entry.is_dir {
                dirs.push(entry.name);
            } else {
                files.push(FileEntry {
                    name: entry.name,
                    size: entry.size,
                    mtime: entry.mtime,
                });
            }
        }
        Ok(DirectoryListing::sorted(dirs, files))
    }

    /// Delete a directory subtree.
    ///
    /// Iterative depth-first walk over an explicit work stack, so a deep or
    /// wide tree cannot overflow the call stack: files are deleted as they
    /// are discovered, directories are collected and removed afterwards in
    /// reverse discovery order (children before parents, so each directory
    /// is empty by the time it is removed). A failure partway aborts the
    /// walk and leaves the tree partially emptied.
    async fn remove_tree(&self, path: &str) -> StorageResult<()> {
        let mut discovered = Vec::new();
        let mut stack = vec![path.to_string()];
        while let Some(dir) = stack.pop() {
            for entry in self.scan(&dir).await? {
                let child = join_logical(&dir, &entry.name);
                if entry.is_dir {
                    stack.push(child);
                } else {
                    self.remove_file(&child).await?;
                }
            }
            discovered.push(dir);
        }

        for dir in discovered.iter().rev() {
            self.remove_dir(dir).await?;
        }
        Ok(())
    }
}

// Blanket implementation for all StorageBackend types, including trait objects.
impl<T: StorageBackend + ?Sized> StorageBackendExt for T {}
