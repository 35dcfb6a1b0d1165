//! Network share backend speaking SFTP over SSH.

use crate::error::{StorageError, StorageResult};
use crate::resolve;
use crate::traits::{ByteStream, ScanEntry, StorageBackend, WriteHandle};
use async_trait::async_trait;
use bytes::Bytes;
use russh::client;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::client::fs::File as SftpFile;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{FileType, OpenFlags};
use shelf_core::DOWNLOAD_CHUNK_SIZE;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// SSH handler for the share connection.
struct ShareHandler;

#[async_trait]
impl client::Handler for ShareHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Host keys are accepted without verification; the share is expected
        // to live on a trusted network.
        warn!("accepting share host key without verification");
        Ok(true)
    }
}

/// File tree on a remote share, accessed over an SFTP subsystem channel.
pub struct ShareBackend {
    // Keeps the SSH connection alive; dropping the handle closes the session.
    _session: client::Handle<ShareHandler>,
    sftp: Arc<SftpSession>,
    share_root: String,
    name: String,
}

impl std::fmt::Debug for ShareBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareBackend")
            .field("share_root", &self.share_root)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Absolute remote path of the share root.
fn share_root_path(share: &str) -> String {
    format!("/{}", share.trim_matches('/'))
}

/// Uniquely named staging sibling for a remote write.
fn temp_sibling(final_path: &str) -> String {
    format!("{}.tmp.{}", final_path, Uuid::new_v4())
}

fn map_sftp_err(path: &str, e: SftpError) -> StorageError {
    if let SftpError::Status(status) = &e
        && matches!(
            status.status_code,
            russh_sftp::protocol::StatusCode::NoSuchFile
        )
    {
        return StorageError::NotFound(path.to_string());
    }
    StorageError::Share(e.to_string())
}

impl ShareBackend {
    /// Connect to the share host, authenticate, and open an SFTP session.
    pub async fn connect(
        host: &str,
        port: u16,
        share: &str,
        username: &str,
        password: &str,
        name: String,
    ) -> StorageResult<Self> {
        let addr = format!("{host}:{port}");
        debug!(addr = %addr, share = %share, "connecting to share");

        let config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };

        let mut session = client::connect(Arc::new(config), &addr, ShareHandler)
            .await
            .map_err(|e| StorageError::Share(format!("connection to {addr} failed: {e}")))?;

        let authenticated = session
            .authenticate_password(username, password)
            .await
            .map_err(|e| StorageError::Share(format!("authentication error: {e}")))?;
        if !authenticated {
            return Err(StorageError::Share(format!(
                "authentication rejected for user {username}"
            )));
        }

        let channel = session
            .channel_open_session()
            .await
            .map_err(|e| StorageError::Share(format!("failed to open channel: {e}")))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| StorageError::Share(format!("sftp subsystem unavailable: {e}")))?;

        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| StorageError::Share(format!("sftp handshake failed: {e}")))?;

        info!(addr = %addr, share = %share, "share connected");

        Ok(Self {
            _session: session,
            sftp: Arc::new(sftp),
            share_root: share_root_path(share),
            name,
        })
    }

    /// Resolve a logical path to an absolute remote path, with path
    /// traversal protection.
    fn full_path(&self, logical: &str) -> StorageResult<String> {
        resolve::share_path(&self.share_root, logical)
    }
}

#[async_trait]
impl StorageBackend for ShareBackend {
    #[instrument(skip(self), fields(backend = "share"))]
    async fn scan(&self, path: &str) -> StorageResult<Vec<ScanEntry>> {
        let remote = self.full_path(path)?;
        let dir = self
            .sftp
            .read_dir(remote)
            .await
            .map_err(|e| map_sftp_err(path, e))?;

        let mut results = Vec::new();
        for entry in dir {
            let name = entry.file_name();
            // READDIR replies include the dot entries on most servers.
            if name == "." || name == ".." {
                continue;
            }
            match entry.file_type() {
                FileType::Dir => results.push(ScanEntry {
                    name,
                    is_dir: true,
                    size: 0,
                    mtime: 0.0,
                }),
                FileType::File => {
                    let attrs = entry.metadata();
                    results.push(ScanEntry {
                        name,
                        is_dir: false,
                        size: attrs.size.unwrap_or(0),
                        mtime: attrs.mtime.map(f64::from).unwrap_or(0.0),
                    });
                }
                _ => {}
            }
        }
        Ok(results)
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let remote = self.full_path(path)?;
        let file = self
            .sftp
            .open_with_flags(remote, OpenFlags::READ)
            .await
            .map_err(|e| map_sftp_err(path, e))?;

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
            // Closes the remote handle; Drop cannot send the close packet.
            let _ = file.shutdown().await;
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn open_write(&self, path: &str) -> StorageResult<Box<dyn WriteHandle>> {
        let final_path = self.full_path(path)?;
        let temp_path = temp_sibling(&final_path);

        let file = self
            .sftp
            .open_with_flags(
                temp_path.clone(),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            )
            .await
            .map_err(|e| map_sftp_err(path, e))?;

        Ok(Box::new(ShareWrite {
            sftp: Arc::clone(&self.sftp),
            file,
            temp_path,
            final_path,
            bytes_written: 0,
        }))
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn make_dir(&self, path: &str) -> StorageResult<()> {
        let remote = self.full_path(path)?;
        self.sftp
            .create_dir(remote)
            .await
            .map_err(|e| map_sftp_err(path, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn remove_dir(&self, path: &str) -> StorageResult<()> {
        let remote = self.full_path(path)?;
        self.sftp
            .remove_dir(remote)
            .await
            .map_err(|e| map_sftp_err(path, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn remove_file(&self, path: &str) -> StorageResult<()> {
        let remote = self.full_path(path)?;
        self.sftp
            .remove_file(remote)
            .await
            .map_err(|e| map_sftp_err(path, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn rename(&self, source: &str, dest: &str) -> StorageResult<()> {
        let source_path = self.full_path(source)?;
        let dest_path = self.full_path(dest)?;
        self.sftp
            .rename(source_path, dest_path)
            .await
            .map_err(|e| map_sftp_err(source, e))?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(backend = "share"))]
    async fn health_check(&self) -> StorageResult<()> {
        let attrs = self
            .sftp
            .metadata(self.share_root.clone())
            .await
            .map_err(|e| StorageError::Share(format!("share not accessible: {e}")))?;

        if !matches!(attrs.file_type(), FileType::Dir) {
            return Err(StorageError::Config(format!(
                "share root is not a directory: {}",
                self.share_root
            )));
        }

        Ok(())
    }
}

/// Staged write for the share backend.
struct ShareWrite {
    sftp: Arc<SftpSession>,
    file: SftpFile,
    temp_path: String,
    final_path: String,
    bytes_written: u64,
}

#[async_trait]
impl WriteHandle for ShareWrite {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        use tokio::io::AsyncWriteExt;

        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<u64> {
        use tokio::io::AsyncWriteExt;

        self.file.shutdown().await?;
        // SFTP rename does not overwrite, so clear a previous file at the
        // destination first.
        let _ = self.sftp.remove_file(&self.final_path).await;
        self.sftp
            .rename(&self.temp_path, &self.final_path)
            .await
            .map_err(|e| StorageError::Share(e.to_string()))?;
        Ok(self.bytes_written)
    }

    async fn abort(mut self: Box<Self>) -> StorageResult<()> {
        use tokio::io::AsyncWriteExt;

        let _ = self.file.shutdown().await;
        let _ = self.sftp.remove_file(&self.temp_path).await;
        Ok(())
    }
}
