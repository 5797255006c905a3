//! Outcome reporting for executions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Mode;

/// A per-pair failure that did not stop the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Result of a completed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// What was executed.
    pub mode: Mode,
    /// Whether this was a preview.
    pub dry_run: bool,
    /// Pairs that produced a report line.
    pub reported: usize,
    /// Pairs left as they were (declined, or not ours to remove).
    pub skipped: usize,
    /// Pairs that failed.
    pub failed: usize,
    /// Errors that occurred.
    pub errors: Vec<OperationError>,
}

impl ExecutionSummary {
    /// Create an empty summary.
    pub fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            reported: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    /// Record a failed pair.
    pub fn add_error(&mut self, error: OperationError) {
        self.failed += 1;
        self.errors.push(error);
    }

    /// Check if every pair succeeded or was deliberately skipped.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the execution.
    pub fn summary(&self) -> String {
        let action = match (self.mode, self.dry_run) {
            (Mode::Create, false) => "Linked",
            (Mode::Clean, false) => "Removed",
            (Mode::Create, true) => "Would link",
            (Mode::Clean, true) => "Would remove",
        };
        let noun = if self.reported == 1 { "file" } else { "files" };

        let mut text = format!("{action} {} {noun}", self.reported);
        if self.skipped > 0 {
            text.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            text.push_str(&format!(", {} failed", self.failed));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_text() {
        let mut summary = ExecutionSummary::new(Mode::Create, false);
        summary.reported = 3;
        assert_eq!(summary.summary(), "Linked 3 files");
        assert!(summary.is_success());

        summary.skipped = 1;
        summary.add_error(OperationError::new("/dest/x", "Backup already exists"));
        assert_eq!(summary.summary(), "Linked 3 files, 1 skipped, 1 failed");
        assert!(!summary.is_success());

        let mut preview = ExecutionSummary::new(Mode::Clean, true);
        preview.reported = 1;
        assert_eq!(preview.summary(), "Would remove 1 file");
    }

    #[test]
    fn test_operation_error_display() {
        let err = OperationError::new("/dest/x", "boom");
        assert_eq!(err.to_string(), "/dest/x: boom");
    }
}
