use anyhow::Result;
use reconcile::KIND_ORDER;

use super::Session;
use crate::Context;
use crate::cli::SpecArgs;
use crate::ui;

/// Load the spec and report what it declares
pub fn run(ctx: &Context, args: &SpecArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let desired = session.desired(args.spec.as_deref())?;

    if !ctx.quiet {
        ui::header("Spec");
        for kind in KIND_ORDER {
            ui::kv(kind.plural(), &desired.count(kind).to_string());
        }
        println!();
    }
    ui::success("Spec is valid");
    Ok(())
}
