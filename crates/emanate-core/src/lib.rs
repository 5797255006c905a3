//! Core types for emanate.
//!
//! This crate provides the data structures shared by the planner and the
//! link engine: layered configuration and its resolved [`Policy`], the
//! injected [`Environment`], ignore-pattern matching and file pairs.

mod config;
mod env;
mod error;
mod ignore;
mod pair;

pub use config::{CONFIG_FILE_NAME, Config, ConfigBuilder, ConfigBuilderError, Policy};
pub use env::Environment;
pub use error::{ConfigError, is_unrecoverable};
pub use ignore::IgnoreMatcher;
pub use pair::{FileIdentity, FilePair, is_occupied};

/// Suffix appended to a destination file when it is moved aside.
pub const BACKUP_SUFFIX: &str = ".emanate";
