//! Create and delete primitives for a single file pair.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use emanate_core::{BACKUP_SUFFIX, FilePair, is_occupied, is_unrecoverable};

use crate::ConfirmGate;

/// Errors from a single link operation.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The backup name for an existing destination file is already taken.
    #[error("Backup already exists: {path}")]
    BackupCollision { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check whether the destination can no longer be written at all.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::BackupCollision { .. } => false,
            Self::Io { source, .. } => is_unrecoverable(source),
        }
    }
}

/// The name an existing destination file is moved to before replacement.
pub fn backup_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Move `dest` aside to its backup name, returning that name.
///
/// Never overwrites an earlier backup.
pub fn backup(dest: &Path) -> Result<PathBuf, LinkError> {
    let target = backup_path(dest);
    if is_occupied(&target) {
        return Err(LinkError::BackupCollision { path: target });
    }

    fs::rename(dest, &target).map_err(|e| LinkError::io(dest, e))?;
    tracing::info!(from = %dest.display(), to = %target.display(), "backed up");
    Ok(target)
}

/// Link `pair.dest` to `pair.src`.
///
/// An occupying file is backed up once `gate` approves; if it declines,
/// nothing changes. Returns whether `dest` now resolves to `src`.
pub fn add_link(pair: &FilePair, gate: &mut ConfirmGate<'_>) -> Result<bool, LinkError> {
    if pair.dest_occupied() {
        if pair.is_linked() {
            return Ok(false);
        }

        if !gate.approve(&pair.dest) {
            tracing::debug!(dest = %pair.dest.display(), "replacement declined");
            return Ok(false);
        }

        backup(&pair.dest)?;
    }

    symlink(&pair.src, &pair.dest).map_err(|e| LinkError::io(&pair.dest, e))?;
    Ok(pair.is_linked())
}

/// Remove the link at `pair.dest` if it resolves to `pair.src`.
///
/// Anything else at that path is left alone. Returns whether `dest` is
/// now absent.
pub fn del_link(pair: &FilePair) -> Result<bool, LinkError> {
    if !pair.dest_occupied() {
        return Ok(true);
    }

    if pair.is_linked() {
        fs::remove_file(&pair.dest).map_err(|e| LinkError::io(&pair.dest, e))?;
    } else {
        tracing::debug!(dest = %pair.dest.display(), "not our link, left untouched");
    }

    Ok(!pair.dest_occupied())
}

#[cfg(unix)]
fn symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dest)
}
