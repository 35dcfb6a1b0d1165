//! Upload session registry.
//!
//! Uploads arrive as a sequence of offset-tagged chunks tied together by a
//! session cookie. The registry owns every live session and enforces the
//! protocol: chunks apply in strict offset order, an empty chunk marks the
//! end of the stream, and completion moves the staged file into place.

use bytes::Bytes;
use shelf_storage::{StorageError, WriteHandle};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Upload protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unknown upload session: {0}")]
    UnknownSession(u64),

    #[error("chunk offset mismatch: expected {expected}, received {received}")]
    OffsetMismatch { expected: u64, received: u64 },

    #[error("upload incomplete: received {received} of {total} bytes")]
    IncompleteUpload { received: u64, total: u64 },

    #[error("upload session {0} already received its final chunk")]
    AlreadySettled(u64),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A single in-progress upload.
struct UploadSession {
    expected_offset: u64,
    total_size: u64,
    eof: bool,
    handle: Box<dyn WriteHandle>,
}

impl UploadSession {
    fn new(total_size: u64, handle: Box<dyn WriteHandle>) -> Self {
        Self {
            expected_offset: 0,
            total_size,
            eof: false,
            handle,
        }
    }

    /// A settled session has received every expected byte, or an explicit
    /// end-of-stream chunk, and waits only for completion.
    fn is_settled(&self) -> bool {
        self.eof || self.expected_offset >= self.total_size
    }
}

struct RegistryInner {
    next_cookie: u64,
    sessions: HashMap<u64, UploadSession>,
}

/// Process-wide registry of live upload sessions.
///
/// Cookies increase monotonically starting at 1 and are never reused within
/// a process lifetime. The lock guards only the map and the counter;
/// `write_chunk` takes the session out of the map before writing, so the
/// lock is never held across I/O. Abandoned sessions never expire; they
/// hold their write handle until the process restarts.
pub struct UploadRegistry {
    inner: Mutex<RegistryInner>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_cookie: 0,
                sessions: HashMap::new(),
            }),
        }
    }

    /// Open a session writing to `handle`, expecting `total_size` bytes.
    /// Returns the session cookie.
    ///
    /// A `total_size` of 0 creates an immediately settled session;
    /// completing it produces an empty file.
    pub async fn begin(&self, total_size: u64, handle: Box<dyn WriteHandle>) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.next_cookie += 1;
        let cookie = inner.next_cookie;
        inner
            .sessions
            .insert(cookie, UploadSession::new(total_size, handle));
        debug!(cookie, total_size, "upload session opened");
        cookie
    }

    /// Apply one chunk to the session identified by `cookie`.
    ///
    /// An empty chunk marks the session settled; the bytes written so far
    /// are then final regardless of the announced total. A chunk whose
    /// offset is not the session's expected offset destroys the session;
    /// the client must restart the upload from scratch. A chunk sent to an
    /// already settled session fails but leaves the session intact, so a
    /// followup `complete` still succeeds.
    pub async fn write_chunk(
        &self,
        cookie: u64,
        offset: u64,
        data: Bytes,
    ) -> Result<(), UploadError> {
        // Take the session out so the write below runs unlocked. A
        // concurrent call bearing the same cookie observes UnknownSession.
        let mut session = {
            let mut inner = self.inner.lock().await;
            inner
                .sessions
                .remove(&cookie)
                .ok_or(UploadError::UnknownSession(cookie))?
        };

        if data.is_empty() {
            session.eof = true;
            debug!(
                cookie,
                bytes = session.expected_offset,
                "upload session settled"
            );
            self.put_back(cookie, session).await;
            return Ok(());
        }

        if session.is_settled() {
            self.put_back(cookie, session).await;
            return Err(UploadError::AlreadySettled(cookie));
        }

        if offset != session.expected_offset {
            let expected = session.expected_offset;
            if let Err(e) = session.handle.abort().await {
                warn!(cookie, error = %e, "failed to abort staged upload");
            }
            debug!(
                cookie,
                expected,
                received = offset,
                "upload session destroyed on offset mismatch"
            );
            return Err(UploadError::OffsetMismatch {
                expected,
                received: offset,
            });
        }

        let len = data.len() as u64;
        match session.handle.write(data).await {
            Ok(()) => {
                session.expected_offset += len;
                self.put_back(cookie, session).await;
                Ok(())
            }
            Err(e) => {
                // The staged bytes are now ambiguous; drop the whole session.
                if let Err(abort_err) = session.handle.abort().await {
                    warn!(cookie, error = %abort_err, "failed to abort staged upload");
                }
                debug!(cookie, error = %e, "upload session destroyed on write failure");
                Err(UploadError::Storage(e))
            }
        }
    }

    /// Complete the session identified by `cookie`, moving the staged file
    /// into place. The session is removed whether or not completion
    /// succeeds.
    pub async fn complete(&self, cookie: u64) -> Result<u64, UploadError> {
        let session = {
            let mut inner = self.inner.lock().await;
            inner
                .sessions
                .remove(&cookie)
                .ok_or(UploadError::UnknownSession(cookie))?
        };

        if !session.is_settled() {
            let received = session.expected_offset;
            let total = session.total_size;
            if let Err(e) = session.handle.abort().await {
                warn!(cookie, error = %e, "failed to abort staged upload");
            }
            debug!(
                cookie,
                received, total, "upload session destroyed as incomplete"
            );
            return Err(UploadError::IncompleteUpload { received, total });
        }

        let written = session.handle.finish().await?;
        info!(cookie, bytes = written, "upload completed");
        Ok(written)
    }

    async fn put_back(&self, cookie: u64, session: UploadSession) {
        self.inner.lock().await.sessions.insert(cookie, session);
    }
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::new()
    }
}
