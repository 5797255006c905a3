//! Source tree walker for emanate.
//!
//! This crate enumerates the source tree of a [`Policy`] and turns it
//! into a lazy sequence of [`FilePair`]s.
//!
//! - **Ignore rules** are applied to every entry; ignored directories are
//!   not descended into.
//! - **Directory scaffolding**: every non-ignored source directory is
//!   mirrored under the destination as it is reached, even when the
//!   caller only previews the run.
//! - **Deterministic order**: entries are visited depth-first, sorted by
//!   name, on a single thread.
//!
//! # Example
//!
//! ```rust,no_run
//! use emanate_core::{Config, Environment, Policy};
//! use emanate_scan::PairPlanner;
//!
//! let env = Environment::from_process().unwrap();
//! let policy = Policy::from_layers(&env, Vec::<Config>::new()).unwrap();
//! let planner = PairPlanner::new(&policy).unwrap();
//!
//! for pair in planner.pairs().unwrap().flatten() {
//!     println!("{}", pair.describe_add());
//! }
//! ```

mod error;
mod planner;

pub use error::PlanError;
pub use planner::{PairPlanner, Pairs};

// Re-export core types for convenience
pub use emanate_core::{FilePair, IgnoreMatcher, Policy};
