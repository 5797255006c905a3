//! Source/destination file pairs and filesystem identity.

use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// The identity of a file on disk, independent of the path used to reach it.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

#[cfg(unix)]
impl FileIdentity {
    /// Identify the file `path` resolves to, following symlinks.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }
}

/// The identity of a file on disk, independent of the path used to reach it.
#[cfg(not(unix))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Fully resolved path.
    pub canonical: PathBuf,
}

#[cfg(not(unix))]
impl FileIdentity {
    /// Identify the file `path` resolves to, following symlinks.
    pub fn of(path: &Path) -> io::Result<Self> {
        Ok(Self {
            canonical: path.canonicalize()?,
        })
    }
}

/// Check whether anything, including a dangling symlink, sits at `path`.
pub fn is_occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// A mirrored file: its absolute source path and where its link belongs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePair {
    /// Absolute path under the source root.
    pub src: PathBuf,
    /// Same relative path, rooted under the destination.
    pub dest: PathBuf,
}

impl FilePair {
    /// Create a new pair.
    pub fn new(src: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }

    /// Check whether `dest` resolves to the same file as `src`.
    ///
    /// When either side cannot be resolved (a dangling `src` symlink, say),
    /// `dest` still counts as linked if it is a symlink pointing at `src`.
    pub fn is_linked(&self) -> bool {
        match (FileIdentity::of(&self.src), FileIdentity::of(&self.dest)) {
            (Ok(src), Ok(dest)) => src == dest,
            _ => std::fs::read_link(&self.dest).is_ok_and(|target| target == self.src),
        }
    }

    /// Check whether something occupies the destination path.
    pub fn dest_occupied(&self) -> bool {
        is_occupied(&self.dest)
    }

    /// Report line for a created link.
    pub fn describe_add(&self) -> String {
        format!("{:?} -> {:?}", self.src, self.dest)
    }

    /// Report line for a removed link.
    pub fn describe_del(&self) -> String {
        format!("{:?}", self.dest)
    }
}
