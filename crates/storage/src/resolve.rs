//! Logical path resolution with traversal protection.
//!
//! Clients supply logical paths relative to the backend root. Both backends
//! funnel every path through this module before touching storage: the local
//! backend gets a filesystem path guaranteed to stay under its base
//! directory, the share backend gets a lexically normalized remote path.

use crate::error::{StorageError, StorageResult};
use std::path::{Component, Path, PathBuf};

/// Reject any logical path containing a parent-directory segment.
///
/// Both separator styles are split on, so `a\..\b` is caught on every
/// platform. Names merely containing dots (`a..b`, `notes..txt`) pass.
pub fn reject_traversal(logical: &str) -> StorageResult<()> {
    if logical.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(StorageError::InvalidPath(format!(
            "path traversal not allowed: {logical}"
        )));
    }
    Ok(())
}

/// Map a logical path to an absolute path under `root`.
///
/// Leading separators are ignored (the path is always interpreted relative
/// to the root); `.` components are dropped; every remaining component must
/// be a normal name. The resolved path is the root itself or a descendant
/// of it.
pub fn local_path(root: &Path, logical: &str) -> StorageResult<PathBuf> {
    reject_traversal(logical)?;

    let relative = logical.trim_start_matches(['/', '\\']);
    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(name) => resolved.push(name),
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "unsafe path component: {logical}"
                )));
            }
        }
    }

    if !resolved.starts_with(root) {
        return Err(StorageError::InvalidPath(format!(
            "resolved path escapes the base directory: {logical}"
        )));
    }

    Ok(resolved)
}

/// Map a logical path to a remote path under the share root.
///
/// No filesystem normalization exists for a remote share, so the check is
/// purely lexical: the path is split on both separator styles, empty and
/// `.` segments are dropped, any `..` segment is rejected, and the result
/// is rebuilt with single `/` separators. The empty logical path resolves
/// to the share root itself.
pub fn share_path(share_root: &str, logical: &str) -> StorageResult<String> {
    let mut segments = Vec::new();
    for segment in logical.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "path traversal not allowed: {logical}"
                )));
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        Ok(share_root.to_string())
    } else {
        Ok(format!("{share_root}/{}", segments.join("/")))
    }
}

/// Join a child name onto a logical path.
pub fn join_logical(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", base.trim_end_matches('/'))
    }
}
