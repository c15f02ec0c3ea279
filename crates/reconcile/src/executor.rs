//! Execution engine - runs atomic statements in order

use crate::context::{AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback, StatementRunner};
use crate::ddl::redact;
use crate::types::{ExecuteOptions, ExecuteSummary, StatementOutcome};
use anyhow::Result;

/// Whether a statement switches execution context rather than acting.
///
/// Running an action under the wrong role is worse than not running it, so a
/// failed context switch stops the whole run.
pub fn is_context_switch(statement: &str) -> bool {
    statement
        .trim_start()
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("USE "))
}

/// Execute statements with the given options and callbacks
///
/// Statements run strictly in order. A failed context switch aborts the run;
/// a failed action is logged and the run continues unless `fail_fast` is set.
/// Statements that never ran are counted as skipped.
pub fn execute<R, P, C>(
    statements: &[String],
    opts: &ExecuteOptions,
    runner: &R,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    R: StatementRunner + ?Sized,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    if statements.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    if opts.dry_run {
        log::info!("Dry run: {} statements not executed", statements.len());
        return Ok(ExecuteSummary::all_skipped(statements.len()));
    }

    if !confirm.confirm(&format!("Execute {} statements?", statements.len()))? {
        return Ok(ExecuteSummary::all_skipped(statements.len()));
    }

    let mut summary = ExecuteSummary::default();
    progress.on_start(statements.len());

    for (index, statement) in statements.iter().enumerate() {
        progress.on_statement_start(index, statement);
        log::debug!("Executing: {}", redact(statement));

        let outcome = match runner.run(statement) {
            Ok(()) => StatementOutcome::Executed,
            Err(e) => {
                let error = redact(&format!("{e:#}"));
                log::warn!("Statement failed: {}: {error}", redact(statement));
                StatementOutcome::Failed { error }
            }
        };

        progress.on_statement_complete(index, statement, &outcome);
        summary.add_outcome(&outcome);

        if !outcome.is_success() && (opts.fail_fast || is_context_switch(statement)) {
            let remaining = statements.len() - index - 1;
            log::error!("Aborting run, {remaining} statements not executed");
            summary.aborted = true;

            let reason = format!("run aborted at statement {}", index + 1);
            for (rest, pending) in statements.iter().enumerate().skip(index + 1) {
                let skipped = StatementOutcome::Skipped {
                    reason: reason.clone(),
                };
                progress.on_statement_complete(rest, pending, &skipped);
                summary.add_outcome(&skipped);
            }
            break;
        }
    }

    progress.on_finish();
    Ok(summary)
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple<R: StatementRunner + ?Sized>(
    statements: &[String],
    opts: &ExecuteOptions,
    runner: &R,
) -> Result<ExecuteSummary> {
    execute(statements, opts, runner, &mut NoProgress, &mut AutoConfirm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AutoDecline;
    use std::cell::RefCell;

    /// Records statements and fails the ones containing a marker
    struct MockRunner {
        fail_on: Vec<&'static str>,
        ran: RefCell<Vec<String>>,
    }

    impl MockRunner {
        fn new(fail_on: &[&'static str]) -> Self {
            Self {
                fail_on: fail_on.to_vec(),
                ran: RefCell::new(Vec::new()),
            }
        }
    }

    impl StatementRunner for MockRunner {
        fn run(&self, statement: &str) -> Result<()> {
            self.ran.borrow_mut().push(statement.to_string());
            if self.fail_on.iter().any(|m| statement.contains(m)) {
                anyhow::bail!("SQL compilation error in: {statement}");
            }
            Ok(())
        }
    }

    /// Keeps every reported outcome
    #[derive(Default)]
    struct RecordingProgress {
        outcomes: Vec<(usize, StatementOutcome)>,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_start(&mut self, _total: usize) {}
        fn on_statement_start(&mut self, _index: usize, _statement: &str) {}
        fn on_statement_complete(&mut self, index: usize, _statement: &str, outcome: &StatementOutcome) {
            self.outcomes.push((index, outcome.clone()));
        }
        fn on_finish(&mut self) {}
    }

    fn statements(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_is_context_switch() {
        assert!(is_context_switch("USE ROLE SYSADMIN"));
        assert!(is_context_switch("  use role x"));
        assert!(!is_context_switch("CREATE USER USE"));
        assert!(!is_context_switch("USE"));
    }

    #[test]
    fn test_execute_empty() {
        let runner = MockRunner::new(&[]);
        let summary = execute_simple(&[], &ExecuteOptions::default(), &runner).unwrap();
        assert_eq!(summary.total(), 0);
        assert!(summary.is_success());
    }

    #[test]
    fn test_execute_in_order() {
        let runner = MockRunner::new(&[]);
        let stmts = statements(&["USE ROLE A", "CREATE ROLE X", "USE ROLE A", "DROP ROLE Y"]);

        let summary = execute_simple(&stmts, &ExecuteOptions::default(), &runner).unwrap();

        assert_eq!(summary.executed, 4);
        assert_eq!(*runner.ran.borrow(), stmts);
    }

    #[test]
    fn test_action_failure_continues() {
        let runner = MockRunner::new(&["CREATE ROLE X"]);
        let stmts = statements(&["USE ROLE A", "CREATE ROLE X", "USE ROLE A", "DROP ROLE Y"]);

        let summary = execute_simple(&stmts, &ExecuteOptions::default(), &runner).unwrap();

        assert_eq!(summary.executed, 3);
        assert_eq!(summary.failed, 1);
        assert!(!summary.aborted);
        assert!(!summary.is_success());
        assert_eq!(runner.ran.borrow().len(), 4);
    }

    #[test]
    fn test_context_switch_failure_aborts() {
        let runner = MockRunner::new(&["USE ROLE MISSING"]);
        let stmts = statements(&["USE ROLE MISSING", "CREATE ROLE X", "USE ROLE A", "DROP ROLE Y"]);

        let summary = execute_simple(&stmts, &ExecuteOptions::default(), &runner).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 3);
        assert!(summary.aborted);
        assert_eq!(summary.total(), 4);
        assert_eq!(runner.ran.borrow().len(), 1);
    }

    #[test]
    fn test_fail_fast_aborts_on_action_failure() {
        let runner = MockRunner::new(&["CREATE ROLE X"]);
        let stmts = statements(&["USE ROLE A", "CREATE ROLE X", "USE ROLE A", "DROP ROLE Y"]);
        let opts = ExecuteOptions {
            fail_fast: true,
            ..Default::default()
        };

        let summary = execute_simple(&stmts, &opts, &runner).unwrap();

        assert_eq!(summary.executed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 2);
        assert!(summary.aborted);
    }

    #[test]
    fn test_dry_run_runs_nothing() {
        let runner = MockRunner::new(&[]);
        let stmts = statements(&["USE ROLE A", "CREATE ROLE X"]);
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };

        let summary = execute_simple(&stmts, &opts, &runner).unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(runner.ran.borrow().is_empty());
    }

    #[test]
    fn test_declined_confirmation_runs_nothing() {
        let runner = MockRunner::new(&[]);
        let stmts = statements(&["USE ROLE A", "CREATE ROLE X"]);

        let summary = execute(
            &stmts,
            &ExecuteOptions::default(),
            &runner,
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(summary, ExecuteSummary::all_skipped(2));
        assert!(runner.ran.borrow().is_empty());
    }

    #[test]
    fn test_abort_reports_pending_statements_as_skipped() {
        let runner = MockRunner::new(&["USE ROLE MISSING"]);
        let stmts = statements(&["USE ROLE MISSING", "CREATE ROLE X", "DROP ROLE Y"]);
        let mut progress = RecordingProgress::default();

        let summary = execute(
            &stmts,
            &ExecuteOptions::default(),
            &runner,
            &mut progress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(summary.skipped, 2);
        let indexes: Vec<usize> = progress.outcomes.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert!(matches!(progress.outcomes[0].1, StatementOutcome::Failed { .. }));
        assert!(
            progress.outcomes[1..]
                .iter()
                .all(|(_, o)| matches!(o, StatementOutcome::Skipped { reason } if reason.contains("statement 1")))
        );
    }

    #[test]
    fn test_failure_error_does_not_leak_password() {
        let runner = MockRunner::new(&["CREATE USER"]);
        let stmts = statements(&["USE ROLE A", "CREATE USER BOB password = 'Hunter2!'"]);
        let mut progress = RecordingProgress::default();

        execute(
            &stmts,
            &ExecuteOptions::default(),
            &runner,
            &mut progress,
            &mut AutoConfirm,
        )
        .unwrap();

        let StatementOutcome::Failed { error } = &progress.outcomes[1].1 else {
            panic!("expected a failure");
        };
        assert!(error.contains("password = '***'"));
        assert!(!error.contains("Hunter2"));
        assert_eq!(runner.ran.borrow()[1], stmts[1]);
    }
}
