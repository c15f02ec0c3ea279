//! Execution with floe's UI: plan display, confirmation, progress, summary

use anyhow::Result;
use colored::Colorize;
use indicatif::ProgressBar;
use reconcile::{
    AutoConfirm, ConfirmCallback, ExecuteSummary, ProgressCallback, ReconciliationPlan, StatementOutcome,
    StatementRunner, is_context_switch,
};
use reconcile::ddl::redact;

use crate::progress;

use super::differ::display_plan;

/// Options for `floe apply`
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Show the plan, run nothing
    pub dry_run: bool,
    /// Stop at the first failed statement
    pub fail_fast: bool,
    /// Skip the confirmation prompt
    pub yes: bool,
}

/// Progress bar over the atomic statements
#[derive(Default)]
struct ConsoleProgress {
    pb: Option<ProgressBar>,
}

impl ProgressCallback for ConsoleProgress {
    fn on_start(&mut self, total: usize) {
        println!();
        println!("  {} Applying {} statements...", "→".cyan(), total);
        self.pb = Some(progress::bar(total as u64, "Applying"));
    }

    fn on_statement_start(&mut self, _index: usize, statement: &str) {
        if let Some(pb) = &self.pb {
            pb.set_message(redact(statement));
        }
    }

    fn on_statement_complete(&mut self, _index: usize, statement: &str, outcome: &StatementOutcome) {
        let Some(pb) = &self.pb else {
            return;
        };
        match outcome {
            StatementOutcome::Failed { error } => {
                pb.println(format!("    {} {}", "✗".red(), redact(statement)));
                pb.println(format!("      {}", error.dimmed()));
            }
            StatementOutcome::Skipped { .. } => {}
            StatementOutcome::Executed if is_context_switch(statement) => {}
            StatementOutcome::Executed => {
                pb.println(format!("    {} {}", "✓".green(), redact(statement)));
            }
        }
        pb.inc(1);
    }

    fn on_finish(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Confirmation through an interactive prompt
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new().with_prompt(prompt).default(false).interact()?;
        if !confirmed {
            println!();
            println!("  {} Aborted", "✗".red());
        }
        Ok(confirmed)
    }
}

/// Show the plan, confirm, then run it
pub fn apply<R: StatementRunner + ?Sized>(
    plan: &ReconciliationPlan,
    runner: &R,
    opts: &ApplyOptions,
) -> Result<ExecuteSummary> {
    display_plan(plan);

    let statements = plan.statements();
    if statements.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    let exec_opts = reconcile::ExecuteOptions {
        dry_run: opts.dry_run,
        fail_fast: opts.fail_fast,
    };
    let mut progress = ConsoleProgress::default();

    let summary = if opts.yes || opts.dry_run {
        reconcile::execute(&statements, &exec_opts, runner, &mut progress, &mut AutoConfirm)?
    } else {
        reconcile::execute(&statements, &exec_opts, runner, &mut progress, &mut PromptConfirm)?
    };

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(summary);
    }

    if summary.executed + summary.failed > 0 {
        print_summary(&summary);
    }
    Ok(summary)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Account reconciled successfully!", "✓".green().bold());
    } else if summary.aborted {
        println!("  {} Run aborted", "✗".red().bold());
    } else {
        println!("  {} Reconciled with errors", "⚠".yellow().bold());
    }

    if summary.executed > 0 {
        println!("    • {} statements executed", summary.executed);
    }
    if summary.skipped > 0 {
        println!("    • {} statements skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "statements".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{ManagedObject, ObjectKind, ObjectSet, resolve_objects};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        ran: Mutex<Vec<String>>,
    }

    impl StatementRunner for Recorder {
        fn run(&self, statement: &str) -> Result<()> {
            match self.ran.lock() {
                Ok(mut ran) => ran.push(statement.to_string()),
                Err(poisoned) => poisoned.into_inner().push(statement.to_string()),
            }
            Ok(())
        }
    }

    fn plan() -> ReconciliationPlan {
        let desired: ObjectSet = [ManagedObject::bare(ObjectKind::Role, "analyst")].into_iter().collect();
        let mut plan = ReconciliationPlan::new();
        plan.insert(ObjectKind::Role, resolve_objects(&ObjectSet::new(), &desired, "SECURITYADMIN"));
        plan
    }

    #[test]
    fn test_apply_with_yes_runs_everything() {
        let runner = Recorder::default();
        let opts = ApplyOptions {
            yes: true,
            ..Default::default()
        };
        let summary = apply(&plan(), &runner, &opts).unwrap();

        assert_eq!(summary.executed, 2);
        assert!(summary.is_success());
        assert_eq!(*runner.ran.lock().unwrap(), vec!["USE ROLE SECURITYADMIN", "CREATE ROLE ANALYST"]);
    }

    #[test]
    fn test_apply_dry_run_runs_nothing() {
        let runner = Recorder::default();
        let opts = ApplyOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = apply(&plan(), &runner, &opts).unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(runner.ran.lock().unwrap().is_empty());
    }

    #[test]
    fn test_apply_empty_plan() {
        let runner = Recorder::default();
        let summary = apply(&ReconciliationPlan::new(), &runner, &ApplyOptions::default()).unwrap();
        assert_eq!(summary, ExecuteSummary::default());
    }
}
