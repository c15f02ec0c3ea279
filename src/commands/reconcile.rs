//! `floe plan` and `floe apply`

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use reconcile::ddl::redact;
use reconcile::{KIND_ORDER, ObjectKind, ReconciliationPlan, StatementBucket};
use serde_json::json;
use std::collections::BTreeMap;

use super::Session;
use crate::Context;
use crate::cli::{ApplyArgs, PlanArgs, SelectionArgs, SpecArgs};
use crate::engine::{self, ApplyOptions};
use crate::inspector::{Inspector, SqlClient};
use crate::progress;
use crate::snowsql::SnowsqlClient;
use crate::ui;

/// Kinds selected with `--only`, all of them by default
fn selected_kinds(selection: &SelectionArgs) -> Vec<ObjectKind> {
    if selection.only.is_empty() {
        KIND_ORDER.to_vec()
    } else {
        KIND_ORDER
            .into_iter()
            .filter(|k| selection.only.contains(k))
            .collect()
    }
}

fn build<C: SqlClient + ?Sized>(
    ctx: &Context,
    session: &Session,
    client: &C,
    spec: &SpecArgs,
    selection: &SelectionArgs,
) -> Result<ReconciliationPlan> {
    let desired = session.desired(spec.spec.as_deref())?;
    let kinds = selected_kinds(selection);
    let inspector = Inspector::new(client, &session.rules);

    let pb = (!ctx.quiet).then(|| progress::spinner("Inspecting account..."));
    let plan = engine::build_plan(&desired, &inspector, &session.config.roles, &session.rules, &kinds);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let plan = plan?;

    let drops = plan.summary().drops;
    if selection.no_drop && drops > 0 {
        if !ctx.quiet {
            ui::warn(&format!("--no-drop: leaving {drops} objects missing from the spec in place"));
        }
        return Ok(plan.without_drops());
    }
    Ok(plan)
}

pub fn plan(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let client = SnowsqlClient::new(&session.config.connection);
    let plan = build(ctx, &session, &client, &args.spec, &args.selection)?;

    if args.json {
        let buckets: BTreeMap<&str, StatementBucket> = plan
            .iter()
            .map(|(kind, bucket)| (kind.plural(), bucket.redacted()))
            .collect();
        let statements: Vec<String> = plan.statements().iter().map(|s| redact(s)).collect();
        let output = json!({
            "summary": plan.summary(),
            "kinds": buckets,
            "statements": statements,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize plan")?
        );
        return Ok(());
    }

    engine::display_plan(&plan);
    if ctx.verbose > 0 && !plan.is_empty() {
        ui::section("Statements");
        engine::display_statements(&plan.statements());
    }
    if !plan.is_empty() && !ctx.quiet {
        println!();
        ui::dim(&format!("Run {} to execute this plan.", "floe apply".bold()));
    }
    Ok(())
}

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let client = SnowsqlClient::new(&session.config.connection);
    let plan = build(ctx, &session, &client, &args.spec, &args.selection)?;

    let opts = ApplyOptions {
        dry_run: args.dry_run,
        fail_fast: args.fail_fast,
        yes: args.yes,
    };
    let summary = engine::apply(&plan, &client, &opts)?;

    if summary.aborted {
        bail!("Run aborted after {} statements", summary.executed + summary.failed);
    }
    if summary.failed > 0 {
        bail!("{} statements failed", summary.failed);
    }
    Ok(())
}
