//! Writing a rewritten source file back to disk

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `<path>.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Overwrite `path` with `content`.
///
/// Before the first overwrite the current file is copied to `<path>.backup`.
/// An existing backup is never replaced, so it always holds the version from
/// before any rewrite. Returns the backup path when one was created.
pub fn write_with_backup(path: &Path, content: &str) -> Result<Option<PathBuf>> {
    let backup = backup_path(path);
    let created = if backup.exists() {
        None
    } else {
        fs::copy(path, &backup).map_err(|e| Error::FileWrite {
            path: backup.clone(),
            source: e,
        })?;
        Some(backup)
    };

    fs::write(path, content).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(created)
}
