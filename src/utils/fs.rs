//! Filesystem utilities.
//!
//! Helper functions for file operations.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{AuditError, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Replace `path` with `contents` via a sibling temp file and a rename, so
/// readers never observe a half-written document.
pub fn write_atomic(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let failed = |reason: String| AuditError::WriteFailed {
        path: path.display().to_string(),
        reason,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| failed(err.to_string()))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| failed(err.to_string()))?;
    if let Ok(meta) = std::fs::metadata(path) {
        // Keep the original permissions; best effort.
        if let Err(err) = std::fs::set_permissions(tmp.path(), meta.permissions()) {
            warn!(path = %path.display(), error = %err, "could not carry over file permissions");
        }
    }
    tmp.persist(path).map_err(|err| failed(err.error.to_string()))?;
    Ok(())
}
