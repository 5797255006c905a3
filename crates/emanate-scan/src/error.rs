//! Error types for planning.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while walking the source tree.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The source root is missing or not a directory.
    #[error("Source is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A mirrored directory could not be created.
    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination holds a non-directory where a directory belongs.
    #[error("Not a directory in destination: {path}")]
    Obstructed { path: PathBuf },
}

impl PlanError {
    /// Create a directory creation error with path context.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// The path the error concerns.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotADirectory { path } | Self::CreateDir { path, .. } | Self::Obstructed { path } => {
                path
            }
        }
    }

    /// Check whether the run cannot meaningfully continue.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::NotADirectory { .. } => true,
            Self::CreateDir { source, .. } => emanate_core::is_unrecoverable(source),
            Self::Obstructed { .. } => false,
        }
    }
}
