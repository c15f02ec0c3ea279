use anyhow::{Context as AnyhowContext, Result};
use reconcile::{KIND_ORDER, ManagedObject, ObjectKind};
use std::collections::BTreeMap;

use super::Session;
use crate::Context;
use crate::inspector::Inspector;
use crate::progress;
use crate::snowsql::SnowsqlClient;

/// Print the live objects of one kind, or of every kind, as JSON
pub fn run(ctx: &Context, kind: Option<ObjectKind>) -> Result<()> {
    let session = Session::open(ctx)?;
    let client = SnowsqlClient::new(&session.config.connection);
    let inspector = Inspector::new(&client, &session.rules);

    let kinds = kind.map_or_else(|| KIND_ORDER.to_vec(), |k| vec![k]);
    let pb = (!ctx.quiet).then(|| progress::spinner("Inspecting account..."));
    let state = inspector.inspect_all(&kinds);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let state = state?;

    let mut output: BTreeMap<&str, Vec<&ManagedObject>> = BTreeMap::new();
    for kind in &kinds {
        let mut objects: Vec<&ManagedObject> = state.get(kind).into_iter().flatten().collect();
        objects.sort_by(|a, b| a.name().cmp(b.name()));
        output.insert(kind.plural(), objects);
    }

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize state")?;
    println!("{json}");
    Ok(())
}
