//! Plan display

use colored::Colorize;
use reconcile::ReconciliationPlan;
use reconcile::ddl::{redact, split_statement};

/// Action clause of a compound statement, without its context switch, secrets masked
fn action(statement: &str) -> String {
    redact(&split_statement(statement).pop().unwrap_or_default())
}

/// Display a plan grouped by kind
pub fn display_plan(plan: &ReconciliationPlan) {
    if plan.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Reconciliation Plan".bold()
    );
    println!("│");

    for (kind, bucket) in plan.iter() {
        if bucket.is_empty() {
            continue;
        }
        println!("│ {}", capitalize(kind.plural()).bold());

        for statement in &bucket.drop {
            println!("│   {} {}", "-".red(), action(statement));
        }
        for statement in &bucket.create {
            println!("│   {} {}", "+".green(), action(statement));
        }
        for statement in &bucket.alter {
            println!("│   {} {}", "~".yellow(), action(statement).dimmed());
        }
        println!("│");
    }

    let summary = plan.summary();
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} create, {} drop, {} alter)",
        summary.total().to_string().bold(),
        summary.creates.to_string().green(),
        summary.drops.to_string().red(),
        summary.alters.to_string().yellow()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Print the flat statement list exactly as the executor will run it
pub fn display_statements(statements: &[String]) {
    for statement in statements {
        println!("{};", redact(statement));
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
