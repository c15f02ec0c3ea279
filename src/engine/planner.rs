//! Plan construction: desired state vs live state, kind by kind

use anyhow::Result;
use reconcile::{KIND_ORDER, ManagedObject, ObjectKind, ObjectSet, ReconciliationPlan, resolve_objects};
use std::collections::{BTreeSet, HashMap};

use crate::config::RolesConfig;
use crate::filter::IgnoreRules;
use crate::inspector::{Inspector, SqlClient, is_observable, is_platform_default};
use crate::loader::DesiredState;

/// Build the reconciliation plan for the selected kinds.
///
/// Kinds are diffed in dependency order with the context role configured for
/// each. Ignore rules apply to the desired side here; the inspector already
/// applied them to the live side.
pub fn build_plan<C: SqlClient + ?Sized>(
    desired: &DesiredState,
    inspector: &Inspector<'_, C>,
    roles: &RolesConfig,
    rules: &IgnoreRules,
    kinds: &[ObjectKind],
) -> Result<ReconciliationPlan> {
    let mut current = inspector.inspect_all(kinds)?;
    let mut plan = ReconciliationPlan::new();

    for kind in KIND_ORDER.into_iter().filter(|k| kinds.contains(k)) {
        let wanted = rules.retain(desired.get(kind));
        warn_unobservable(kind, &wanted);

        let live = prune_defaults(current.remove(&kind).unwrap_or_default(), &wanted);
        let bucket = resolve_objects(&live, &wanted, roles.for_kind(kind));
        log::info!(
            "{}: {} to create, {} to drop, {} attribute changes",
            kind.plural(),
            bucket.create.len(),
            bucket.drop.len(),
            bucket.alter.len()
        );
        plan.insert(kind, bucket);
    }

    Ok(plan.retain_kinds(kinds))
}

/// Remove live params the spec does not mention and that still hold their
/// platform default. A non-default value stays and is unset by the diff.
///
/// Objects missing from the spec are left whole since they are dropped anyway.
pub fn prune_defaults(current: ObjectSet, desired: &ObjectSet) -> ObjectSet {
    let wanted: HashMap<&str, &ManagedObject> = desired.iter().map(|o| (o.name(), o)).collect();

    current
        .into_iter()
        .map(|live| match wanted.get(live.name()) {
            Some(target) => {
                let defaulted: Vec<String> = live
                    .params()
                    .iter()
                    .filter(|(key, value)| target.param(key).is_none() && is_platform_default(&live, key, value))
                    .map(|(key, _)| key.clone())
                    .collect();
                live.retain_params(|key| !defaulted.iter().any(|d| d == key))
            }
            None => live,
        })
        .collect()
}

/// Params the inspector cannot read back would be SET on every run
fn warn_unobservable(kind: ObjectKind, desired: &ObjectSet) {
    let blind: BTreeSet<&str> = desired
        .iter()
        .flat_map(|o| o.params().keys())
        .map(String::as_str)
        .filter(|key| !kind.is_create_only(key) && !is_observable(kind, key))
        .collect();

    if !blind.is_empty() {
        log::warn!(
            "{} params not reported by the live system, re-applied every run: {}",
            kind,
            blind.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IgnoreConfig;
    use crate::inspector::tests::StaticClient;
    use crate::loader::parse_spec;
    use crate::password::FixedPassword;

    const SPEC: &str = r#"
warehouses:
  - loading:
      meta:
        warehouse_size: medium
databases:
  - raw:
roles:
  - loader:
      owns:
        schemas: [raw.events]
users:
  - svc_loader:
      meta:
        default_role: loader
"#;

    fn desired() -> DesiredState {
        parse_spec(SPEC, &FixedPassword("pw".to_string())).unwrap()
    }

    fn plan_with(client: &StaticClient, kinds: &[ObjectKind]) -> ReconciliationPlan {
        let rules = IgnoreRules::builtin();
        let inspector = Inspector::new(client, &rules);
        build_plan(&desired(), &inspector, &RolesConfig::default(), &rules, kinds).unwrap()
    }

    #[test]
    fn test_empty_account_creates_everything() {
        let plan = plan_with(&StaticClient::default(), &KIND_ORDER);
        let statements = plan.statements();

        assert_eq!(plan.summary().creates, 5);
        assert_eq!(statements[0], "USE ROLE SYSADMIN");
        assert!(statements[1].starts_with("CREATE WAREHOUSE LOADING"));
        assert!(statements.contains(&"USE ROLE SECURITYADMIN".to_string()));
        let last = statements.last().unwrap();
        assert_eq!(last, "CREATE SCHEMA RAW.EVENTS");
    }

    #[test]
    fn test_converged_account_is_empty() {
        let client = StaticClient::default()
            .with(ObjectKind::Warehouse, vec![vec![
                ("name", "LOADING"),
                ("size", "Medium"),
                ("auto_suspend", "600"),
                ("auto_resume", "true"),
                ("comment", ""),
                ("resource_monitor", "null"),
            ]])
            .with(ObjectKind::Database, vec![vec![("name", "RAW"), ("retention_time", "1")]])
            .with(ObjectKind::Role, vec![vec![("name", "LOADER"), ("comment", "")], vec![("name", "SYSADMIN")]])
            .with(ObjectKind::User, vec![vec![
                ("name", "SVC_LOADER"),
                ("login_name", "SVC_LOADER"),
                ("display_name", "SVC_LOADER"),
                ("default_role", "loader"),
                ("disabled", "false"),
                ("email", "null"),
            ]])
            .with(ObjectKind::Schema, vec![
                vec![("name", "EVENTS"), ("database_name", "RAW")],
                vec![("name", "PUBLIC"), ("database_name", "RAW")],
            ]);

        let plan = plan_with(&client, &KIND_ORDER);
        assert!(plan.is_empty(), "{:?}", plan.statements());
    }

    #[test]
    fn test_drift_yields_alters_and_drops() {
        let client = StaticClient::default()
            .with(ObjectKind::Warehouse, vec![
                vec![("name", "LOADING"), ("size", "X-Small"), ("comment", "legacy")],
                vec![("name", "OLD_WH"), ("size", "Small")],
            ]);

        let plan = plan_with(&client, &[ObjectKind::Warehouse]);
        let bucket = plan.bucket(ObjectKind::Warehouse).unwrap();

        assert_eq!(bucket.drop, vec!["USE ROLE SYSADMIN; DROP WAREHOUSE OLD_WH"]);
        assert_eq!(bucket.alter, vec![
            "USE ROLE SYSADMIN; ALTER WAREHOUSE LOADING SET warehouse_size = 'medium'",
            "USE ROLE SYSADMIN; ALTER WAREHOUSE LOADING UNSET comment",
        ]);
        assert_eq!(plan.kind_order(), &[ObjectKind::Warehouse]);
    }

    #[test]
    fn test_configured_ignore_protects_both_sides() {
        let client = StaticClient::default().with(ObjectKind::User, vec![vec![("name", "DBT_CLOUD_PROD")]]);
        let config = IgnoreConfig {
            users: vec!["dbt_cloud_*".to_string(), "svc_*".to_string()],
            ..Default::default()
        };
        let rules = IgnoreRules::from_config(&config).unwrap();
        let inspector = Inspector::new(&client, &rules);

        let plan = build_plan(&desired(), &inspector, &RolesConfig::default(), &rules, &[ObjectKind::User]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_dropped_non_default_values_are_unset() {
        let client = StaticClient::default().with(ObjectKind::Warehouse, vec![vec![
            ("name", "LOADING"),
            ("size", "Medium"),
            ("auto_suspend", "60"),
            ("auto_resume", "true"),
            ("min_cluster_count", "3"),
        ]]);

        let plan = plan_with(&client, &[ObjectKind::Warehouse]);
        assert_eq!(plan.bucket(ObjectKind::Warehouse).unwrap().alter, vec![
            "USE ROLE SYSADMIN; ALTER WAREHOUSE LOADING UNSET auto_suspend",
            "USE ROLE SYSADMIN; ALTER WAREHOUSE LOADING UNSET min_cluster_count",
        ]);
    }

    #[test]
    fn test_prune_defaults_keeps_non_default_user_fields() {
        let live: ObjectSet = [ManagedObject::new(ObjectKind::User, "dbt", [
            ("login_name", "DBT"),
            ("display_name", "dbt service"),
            ("disabled", "true"),
        ])]
        .into_iter()
        .collect();
        let wanted: ObjectSet = [ManagedObject::bare(ObjectKind::User, "dbt")].into_iter().collect();

        let pruned = prune_defaults(live, &wanted);
        let obj = pruned.iter().next().unwrap();
        assert!(obj.param("login_name").is_none());
        assert_eq!(obj.param("display_name"), Some(&reconcile::ParamValue::from("dbt service")));
        assert_eq!(obj.param("disabled"), Some(&reconcile::ParamValue::from("true")));
    }

    #[test]
    fn test_prune_defaults_keeps_declared() {
        let live: ObjectSet = [ManagedObject::new(ObjectKind::Warehouse, "wh", [
            ("warehouse_size", "xsmall"),
            ("auto_suspend", "600"),
            ("min_cluster_count", "1"),
            ("comment", "x"),
        ])]
        .into_iter()
        .collect();
        let wanted: ObjectSet = [ManagedObject::new(ObjectKind::Warehouse, "wh", [
            ("warehouse_size", "xsmall"),
            ("auto_suspend", "60"),
        ])]
        .into_iter()
        .collect();

        let pruned = prune_defaults(live, &wanted);
        let obj = pruned.iter().next().unwrap();
        assert!(obj.param("auto_suspend").is_some());
        assert!(obj.param("min_cluster_count").is_none());
        assert!(obj.param("comment").is_some());
    }
}
