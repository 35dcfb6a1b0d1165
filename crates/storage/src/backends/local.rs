//! Local filesystem backend.

use crate::error::{StorageError, StorageResult};
use crate::resolve;
use crate::traits::{ByteStream, ScanEntry, StorageBackend, WriteHandle};
use async_trait::async_trait;
use bytes::Bytes;
use shelf_core::DOWNLOAD_CHUNK_SIZE;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// File tree rooted at a local base directory.
pub struct LocalBackend {
    root: PathBuf,
    name: String,
}

impl LocalBackend {
    /// Create a new local backend rooted at `root`, creating the base
    /// directory if it does not exist yet.
    pub async fn new(root: impl AsRef<Path>, name: String) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root, name })
    }

    /// Resolve a logical path under the base directory, with path
    /// traversal protection.
    fn full_path(&self, logical: &str) -> StorageResult<PathBuf> {
        resolve::local_path(&self.root, logical)
    }
}

fn unix_seconds(time: std::io::Result<SystemTime>) -> f64 {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[async_trait]
impl StorageBackend for LocalBackend {
    #[instrument(skip(self), fields(backend = "local"))]
    async fn scan(&self, path: &str) -> StorageResult<Vec<ScanEntry>> {
        let dir = self.full_path(path)?;
        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        let mut results = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            // file_type() does not follow symlinks; links and special files
            // are not listed.
            let file_type = entry.file_type().await?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_dir() {
                results.push(ScanEntry {
                    name,
                    is_dir: true,
                    size: 0,
                    mtime: 0.0,
                });
            } else if file_type.is_file() {
                let metadata = entry.metadata().await?;
                results.push(ScanEntry {
                    name,
                    is_dir: false,
                    size: metadata.len(),
                    mtime: unix_seconds(metadata.modified()),
                });
            }
        }
        Ok(results)
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let file_path = self.full_path(path)?;
        let file = fs::File::open(&file_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Opening a directory read-only succeeds on Linux; fail here rather
        // than midway through the response body.
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::other(format!(
                "not a regular file: {path}"
            ))));
        }

        // Stream the file in bounded chunks instead of loading it into memory.
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn open_write(&self, path: &str) -> StorageResult<Box<dyn WriteHandle>> {
        let final_path = self.full_path(path)?;

        // Stage into a uniquely named sibling, then rename on finish. The
        // parent directory must already exist; directories are only created
        // through make_dir.
        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = final_path.with_file_name(
            final_path
                .file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        let file = fs::File::create(&temp_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        Ok(Box::new(LocalWrite {
            file,
            temp_path,
            final_path,
            bytes_written: 0,
        }))
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn make_dir(&self, path: &str) -> StorageResult<()> {
        let dir = self.full_path(path)?;
        fs::create_dir(&dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn remove_dir(&self, path: &str) -> StorageResult<()> {
        let dir = self.full_path(path)?;
        fs::remove_dir(&dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn remove_file(&self, path: &str) -> StorageResult<()> {
        let file_path = self.full_path(path)?;
        fs::remove_file(&file_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn rename(&self, source: &str, dest: &str) -> StorageResult<()> {
        let source_path = self.full_path(source)?;
        let dest_path = self.full_path(dest)?;
        fs::rename(&source_path, &dest_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(source.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("base directory not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Config(format!(
                "base directory is not a directory: {}",
                self.root.display()
            )));
        }

        Ok(())
    }
}

/// Staged write for the local backend.
struct LocalWrite {
    file: fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
}

#[async_trait]
impl WriteHandle for LocalWrite {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<u64> {
        // Flush to disk before the rename makes the file visible.
        self.file.sync_all().await?;
        drop(self.file);
        fs::rename(&self.temp_path, &self.final_path).await?;
        Ok(self.bytes_written)
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        drop(self.file);
        let _ = fs::remove_file(&self.temp_path).await;
        Ok(())
    }
}
