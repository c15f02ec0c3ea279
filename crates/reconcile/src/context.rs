//! Execution context and provider traits
//!
//! These traits allow the reconcile crate to be used without
//! depending on a specific database client, progress UI or prompt library.

use crate::types::StatementOutcome;
use anyhow::Result;

/// Runs one atomic statement against the live system
///
/// Implement this trait to connect the executor to a database client.
pub trait StatementRunner {
    /// Execute a single statement, returning an error if the system rejects it
    fn run(&self, statement: &str) -> Result<()>;
}

impl<R: StatementRunner + ?Sized> StatementRunner for &R {
    fn run(&self, statement: &str) -> Result<()> {
        (**self).run(statement)
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once before the first statement runs
    fn on_start(&mut self, total: usize);

    /// Called when starting a single statement
    fn on_statement_start(&mut self, index: usize, statement: &str);

    /// Called when a statement completes
    fn on_statement_complete(&mut self, index: usize, statement: &str, outcome: &StatementOutcome);

    /// Called after the last statement (or after an abort)
    fn on_finish(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _total: usize) {}
    fn on_statement_start(&mut self, _index: usize, _statement: &str) {}
    fn on_statement_complete(&mut self, _index: usize, _statement: &str, _outcome: &StatementOutcome) {}
    fn on_finish(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
