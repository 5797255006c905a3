//! One-shot executions over a planned pair sequence.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use emanate_core::{FilePair, Policy};
use emanate_scan::{PairPlanner, PlanError};

use crate::link::{self, LinkError};
use crate::summary::{ExecutionSummary, OperationError};
use crate::{Confirm, ConfirmGate};

/// What an execution does to each pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Link each destination to its source.
    Create,
    /// Remove links this tool created.
    Clean,
}

impl Mode {
    /// The report line for `pair`.
    pub fn describe(&self, pair: &FilePair) -> String {
        match self {
            Self::Create => pair.describe_add(),
            Self::Clean => pair.describe_del(),
        }
    }
}

/// Errors that stop an execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The walk cannot continue.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The destination can no longer be written.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Report lines could not be written.
    #[error("Failed to write report: {0}")]
    Output(#[source] io::Error),
}

type PairIter<'a> = Box<dyn Iterator<Item = Result<FilePair, PlanError>> + 'a>;

/// A prepared, single-use unit of work.
///
/// Both [`run`](Self::run) and [`dry`](Self::dry) consume the execution;
/// a fresh one must be prepared to act on the tree again.
pub struct Execution<'a> {
    mode: Mode,
    pairs: PairIter<'a>,
    gate: ConfirmGate<'a>,
}

impl<'a> Execution<'a> {
    /// Prepare link creation.
    ///
    /// Pairs already linked correctly are dropped up front, so they are
    /// neither reported nor prompted for. `prompt` is consulted only when
    /// the policy asks for confirmation.
    pub fn create(policy: &Policy, prompt: impl Confirm + 'a) -> Result<Self, PlanError> {
        let pairs = PairPlanner::new(policy)?
            .pairs()?
            .filter(|item| item.as_ref().map_or(true, |pair| !pair.is_linked()));

        Ok(Self {
            mode: Mode::Create,
            pairs: Box::new(pairs),
            gate: ConfirmGate::new(policy.confirm, prompt),
        })
    }

    /// Prepare link removal.
    ///
    /// Pairs whose destination does not exist are dropped up front.
    pub fn clean(policy: &Policy) -> Result<Self, PlanError> {
        let pairs = PairPlanner::new(policy)?
            .pairs()?
            .filter(|item| item.as_ref().map_or(true, FilePair::dest_occupied));

        Ok(Self {
            mode: Mode::Clean,
            pairs: Box::new(pairs),
            gate: ConfirmGate::auto(),
        })
    }

    /// Prepare an execution for `mode`.
    pub fn for_mode(
        mode: Mode,
        policy: &Policy,
        prompt: impl Confirm + 'a,
    ) -> Result<Self, PlanError> {
        match mode {
            Mode::Create => Self::create(policy, prompt),
            Mode::Clean => Self::clean(policy),
        }
    }

    /// What this execution does.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply the operation to each pair, reporting those that changed.
    ///
    /// A failing pair is recorded and the run moves on, unless the failure
    /// means nothing further can succeed.
    pub fn run<W: Write>(self, out: &mut W) -> Result<ExecutionSummary, ExecutionError> {
        let Self {
            mode,
            pairs,
            mut gate,
        } = self;
        let mut summary = ExecutionSummary::new(mode, false);

        for item in pairs {
            let Some(pair) = accept(item, &mut summary)? else {
                continue;
            };

            let outcome = match mode {
                Mode::Create => link::add_link(&pair, &mut gate),
                Mode::Clean => link::del_link(&pair),
            };

            match outcome {
                Ok(true) => {
                    writeln!(out, "{}", mode.describe(&pair)).map_err(ExecutionError::Output)?;
                    summary.reported += 1;
                }
                Ok(false) => summary.skipped += 1,
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(dest = %pair.dest.display(), %err, "operation failed");
                    summary.add_error(OperationError::new(&pair.dest, err.to_string()));
                }
            }
        }

        tracing::info!(%mode, "{}", summary.summary());
        Ok(summary)
    }

    /// Report every pair without changing any link.
    pub fn dry<W: Write>(self, out: &mut W) -> Result<ExecutionSummary, ExecutionError> {
        let mut summary = ExecutionSummary::new(self.mode, true);

        for item in self.pairs {
            let Some(pair) = accept(item, &mut summary)? else {
                continue;
            };
            writeln!(out, "{}", self.mode.describe(&pair)).map_err(ExecutionError::Output)?;
            summary.reported += 1;
        }

        tracing::info!(mode = %self.mode, "{}", summary.summary());
        Ok(summary)
    }
}

impl std::fmt::Debug for Execution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution")
            .field("mode", &self.mode)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

/// Unwrap a planned pair, recording recoverable planning errors.
fn accept(
    item: Result<FilePair, PlanError>,
    summary: &mut ExecutionSummary,
) -> Result<Option<FilePair>, ExecutionError> {
    match item {
        Ok(pair) => Ok(Some(pair)),
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(err) => {
            tracing::warn!(path = %err.path().display(), %err, "planning failed");
            summary.add_error(OperationError::new(err.path(), err.to_string()));
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::Create.to_string(), "create");
        assert_eq!(Mode::from_str("clean").unwrap(), Mode::Clean);
    }

    #[test]
    fn test_mode_describe() {
        let pair = FilePair::new("/s/a", "/d/a");
        assert_eq!(Mode::Create.describe(&pair), r#""/s/a" -> "/d/a""#);
        assert_eq!(Mode::Clean.describe(&pair), r#""/d/a""#);
    }
}
