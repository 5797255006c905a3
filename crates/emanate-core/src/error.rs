//! Error types for configuration handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a [`Policy`](crate::Policy).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is missing, or a path cannot be resolved.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Strict merge was given a layer that still holds relative paths.
    #[error("Unresolved configuration: `{field}` is not absolute ({path})")]
    UnresolvedConfig { field: &'static str, path: PathBuf },

    /// The configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected schema.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Check whether an I/O error means the destination can no longer be written
/// at all, as opposed to a problem with one particular path.
pub fn is_unrecoverable(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ReadOnlyFilesystem | std::io::ErrorKind::StorageFull
    )
}
