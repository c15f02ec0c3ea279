//! Core types for statement execution

use serde::{Deserialize, Serialize};

/// Result of running one atomic statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementOutcome {
    /// Statement ran successfully
    Executed,
    /// The live system rejected the statement
    Failed { error: String },
    /// Statement was not run
    Skipped { reason: String },
}

impl StatementOutcome {
    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub executed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Whether a fatal failure stopped the run early
    pub aborted: bool,
}

impl ExecuteSummary {
    /// Summary where every statement was skipped
    pub fn all_skipped(count: usize) -> Self {
        Self {
            skipped: count,
            ..Default::default()
        }
    }

    /// Check if execution was fully successful
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.aborted
    }

    /// Total number of statements accounted for
    pub fn total(&self) -> usize {
        self.executed + self.failed + self.skipped
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &StatementOutcome) {
        match outcome {
            StatementOutcome::Executed => self.executed += 1,
            StatementOutcome::Failed { .. } => self.failed += 1,
            StatementOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't run anything, just report what would run
    pub dry_run: bool,
    /// Treat every failed statement as fatal
    pub fail_fast: bool,
}
