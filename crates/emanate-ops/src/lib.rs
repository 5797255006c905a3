//! Link operations and execution engine for emanate.
//!
//! This crate applies a planned sequence of file pairs to the destination
//! tree. An [`Execution`] is prepared for one [`Mode`] and consumed by
//! either [`Execution::run`], which mutates the filesystem and reports each
//! change, or [`Execution::dry`], which reports every pair and touches
//! nothing but directory scaffolding.

mod confirm;
mod execution;
mod link;
mod summary;

pub use confirm::{Confirm, ConfirmGate, Prompt};
pub use execution::{Execution, ExecutionError, Mode};
pub use link::{LinkError, add_link, backup, backup_path, del_link};
pub use summary::{ExecutionSummary, OperationError};

// Re-export planning types for convenience
pub use emanate_scan::{FilePair, PairPlanner, PlanError, Policy};
