//! Current state of the live system
//!
//! One `SHOW` query per kind. Only the columns listed in [`columns`] become
//! params, renamed to the attribute names the spec document and the DDL use.

use anyhow::{Context, Result};
use rayon::prelude::*;
use reconcile::{ManagedObject, ObjectKind, ObjectSet, ParamValue};
use std::collections::HashMap;

use crate::filter::IgnoreRules;
use crate::normalize::normalize_value;

/// One result row, keyed by lower-cased column name
pub type Row = HashMap<String, String>;

/// Read-only access to the live system
pub trait SqlClient: Sync {
    fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Query listing every object of a kind
pub fn show_query(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Warehouse => "SHOW WAREHOUSES",
        ObjectKind::Database => "SHOW DATABASES",
        ObjectKind::Role => "SHOW ROLES",
        ObjectKind::User => "SHOW USERS",
        ObjectKind::Schema => "SHOW SCHEMAS IN ACCOUNT",
    }
}

/// `(column, param)` pairs read from each kind's SHOW output
pub fn columns(kind: ObjectKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        ObjectKind::Warehouse => &[
            ("size", "warehouse_size"),
            ("auto_suspend", "auto_suspend"),
            ("auto_resume", "auto_resume"),
            ("min_cluster_count", "min_cluster_count"),
            ("max_cluster_count", "max_cluster_count"),
            ("scaling_policy", "scaling_policy"),
            ("resource_monitor", "resource_monitor"),
            ("comment", "comment"),
        ],
        ObjectKind::Database => &[
            ("retention_time", "data_retention_time_in_days"),
            ("comment", "comment"),
        ],
        ObjectKind::Role => &[("comment", "comment")],
        ObjectKind::User => &[
            ("login_name", "login_name"),
            ("display_name", "display_name"),
            ("first_name", "first_name"),
            ("last_name", "last_name"),
            ("email", "email"),
            ("comment", "comment"),
            ("default_warehouse", "default_warehouse"),
            ("default_namespace", "default_namespace"),
            ("default_role", "default_role"),
            ("disabled", "disabled"),
        ],
        ObjectKind::Schema => &[],
    }
}

/// Value the platform fills in for an attribute left out at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformDefault {
    Value(&'static str),
    /// The object's own name
    ObjectName,
}

/// Params the live system always reports, with the platform default each
/// one takes when the object was created without it.
pub fn platform_defaults(kind: ObjectKind) -> &'static [(&'static str, PlatformDefault)] {
    use PlatformDefault::{ObjectName, Value};
    match kind {
        ObjectKind::Warehouse => &[
            ("auto_suspend", Value("600")),
            ("auto_resume", Value("true")),
            ("min_cluster_count", Value("1")),
            ("max_cluster_count", Value("1")),
            ("scaling_policy", Value("STANDARD")),
        ],
        ObjectKind::Database => &[("data_retention_time_in_days", Value("1"))],
        ObjectKind::User => &[
            ("login_name", ObjectName),
            ("display_name", ObjectName),
            ("disabled", Value("false")),
        ],
        ObjectKind::Role | ObjectKind::Schema => &[],
    }
}

/// Whether a live value is just the platform default for that attribute.
///
/// An object that leaves such an attribute out of the spec accepts the
/// default, so the live value must not be unset. Any other value is drift.
pub fn is_platform_default(object: &ManagedObject, key: &str, value: &ParamValue) -> bool {
    let Some(text) = value.as_text() else {
        return false;
    };
    platform_defaults(object.kind())
        .iter()
        .find(|(param, _)| *param == key)
        .is_some_and(|(_, default)| match default {
            PlatformDefault::Value(v) => text.trim().eq_ignore_ascii_case(v),
            PlatformDefault::ObjectName => text.trim().eq_ignore_ascii_case(object.name()),
        })
}

/// Whether the inspector reports a param for this kind
pub fn is_observable(kind: ObjectKind, param: &str) -> bool {
    columns(kind).iter().any(|(_, p)| *p == param)
}

/// Build an object from one SHOW row. Rows without a name are skipped.
pub fn row_to_object(kind: ObjectKind, row: &Row) -> Option<ManagedObject> {
    let name = row.get("name").map(|n| n.trim()).filter(|n| !n.is_empty())?;

    if kind == ObjectKind::Schema {
        let database = row.get("database_name").map(|d| d.trim()).filter(|d| !d.is_empty())?;
        return Some(ManagedObject::bare(kind, &format!("{database}.{name}")));
    }

    let params = columns(kind).iter().filter_map(|(column, param)| {
        row.get(*column)
            .map(|v| (*param, ParamValue::Text(normalize_value(param, v))))
    });
    Some(ManagedObject::new(kind, name, params))
}

/// Reads the current object sets through a [`SqlClient`]
pub struct Inspector<'a, C: SqlClient + ?Sized> {
    client: &'a C,
    rules: &'a IgnoreRules,
}

impl<'a, C: SqlClient + ?Sized> Inspector<'a, C> {
    pub const fn new(client: &'a C, rules: &'a IgnoreRules) -> Self {
        Self { client, rules }
    }

    /// Current objects of one kind, ignored objects removed
    pub fn inspect(&self, kind: ObjectKind) -> Result<ObjectSet> {
        let sql = show_query(kind);
        let rows = self
            .client
            .query(sql)
            .with_context(|| format!("Failed to inspect {}", kind.plural()))?;

        let objects: ObjectSet = rows.iter().filter_map(|row| row_to_object(kind, row)).collect();
        let objects = self.rules.retain(objects);
        log::info!("Found {} {}", objects.len(), kind.plural());
        Ok(objects)
    }

    /// Inspect several kinds. Queries are independent and run in parallel.
    pub fn inspect_all(&self, kinds: &[ObjectKind]) -> Result<HashMap<ObjectKind, ObjectSet>> {
        kinds
            .par_iter()
            .map(|kind| self.inspect(*kind).map(|objects| (*kind, objects)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Canned rows per query
    #[derive(Default)]
    pub(crate) struct StaticClient {
        pub(crate) rows: HashMap<String, Vec<Row>>,
    }

    impl StaticClient {
        pub(crate) fn with(mut self, kind: ObjectKind, rows: Vec<Vec<(&str, &str)>>) -> Self {
            let rows = rows
                .into_iter()
                .map(|r| r.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
                .collect();
            self.rows.insert(show_query(kind).to_string(), rows);
            self
        }
    }

    impl SqlClient for StaticClient {
        fn query(&self, sql: &str) -> Result<Vec<Row>> {
            Ok(self.rows.get(sql).cloned().unwrap_or_default())
        }
    }

    struct FailingClient;

    impl SqlClient for FailingClient {
        fn query(&self, _sql: &str) -> Result<Vec<Row>> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_warehouse_row_mapping() {
        let row: Row = [("name", "loading"), ("size", "X-Small"), ("auto_suspend", "60"), ("state", "STARTED")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let obj = row_to_object(ObjectKind::Warehouse, &row).unwrap();
        assert_eq!(obj.name(), "LOADING");
        assert_eq!(obj.param("warehouse_size"), Some(&ParamValue::from("xsmall")));
        assert_eq!(obj.param("auto_suspend"), Some(&ParamValue::from("60")));
        assert!(obj.param("state").is_none());
        assert!(obj.param("size").is_none());
    }

    #[test]
    fn test_schema_row_mapping() {
        let row: Row = [("name", "REPORTING"), ("database_name", "ANALYTICS")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let obj = row_to_object(ObjectKind::Schema, &row).unwrap();
        assert_eq!(obj.name(), "ANALYTICS.REPORTING");
        assert!(obj.params().is_empty());
    }

    #[test]
    fn test_row_without_name_skipped() {
        let row: Row = [("comment".to_string(), "x".to_string())].into_iter().collect();
        assert!(row_to_object(ObjectKind::Role, &row).is_none());
    }

    #[test]
    fn test_inspect_filters_system_objects() {
        let client = StaticClient::default().with(ObjectKind::Role, vec![
            vec![("name", "ACCOUNTADMIN"), ("comment", "")],
            vec![("name", "ANALYST"), ("comment", "null")],
            vec![("name", "PUBLIC")],
        ]);
        let rules = IgnoreRules::builtin();
        let roles = Inspector::new(&client, &rules).inspect(ObjectKind::Role).unwrap();

        assert_eq!(roles.len(), 1);
        let analyst = roles.iter().next().unwrap();
        assert_eq!(analyst.name(), "ANALYST");
        assert_eq!(analyst.param("comment"), Some(&ParamValue::from("null")));
    }

    #[test]
    fn test_inspect_filters_staging_schemas() {
        let client = StaticClient::default().with(ObjectKind::Schema, vec![
            vec![("name", "REPORTING"), ("database_name", "ANALYTICS")],
            vec![("name", "REPORTING_NEXT"), ("database_name", "ANALYTICS")],
            vec![("name", "INFORMATION_SCHEMA"), ("database_name", "ANALYTICS")],
        ]);
        let rules = IgnoreRules::builtin();
        let schemas = Inspector::new(&client, &rules).inspect(ObjectKind::Schema).unwrap();

        let names: Vec<_> = schemas.iter().map(ManagedObject::name).collect();
        assert_eq!(names, vec!["ANALYTICS.REPORTING"]);
    }

    #[test]
    fn test_inspect_all() {
        let client = StaticClient::default()
            .with(ObjectKind::Warehouse, vec![vec![("name", "WH"), ("size", "Medium")]])
            .with(ObjectKind::Database, vec![vec![("name", "RAW")], vec![("name", "SNOWFLAKE")]]);
        let rules = IgnoreRules::builtin();
        let state = Inspector::new(&client, &rules)
            .inspect_all(&reconcile::KIND_ORDER)
            .unwrap();

        assert_eq!(state.len(), 5);
        assert_eq!(state[&ObjectKind::Warehouse].len(), 1);
        assert_eq!(state[&ObjectKind::Database].len(), 1);
        assert!(state[&ObjectKind::User].is_empty());
    }

    #[test]
    fn test_inspect_error_names_kind() {
        let rules = IgnoreRules::builtin();
        let err = Inspector::new(&FailingClient, &rules)
            .inspect(ObjectKind::User)
            .unwrap_err();
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn test_is_platform_default() {
        let wh = ManagedObject::bare(ObjectKind::Warehouse, "wh");
        assert!(is_platform_default(&wh, "auto_suspend", &"600".into()));
        assert!(is_platform_default(&wh, "scaling_policy", &"Standard".into()));
        assert!(!is_platform_default(&wh, "auto_suspend", &"60".into()));
        assert!(!is_platform_default(&wh, "comment", &"600".into()));

        let user = ManagedObject::bare(ObjectKind::User, "dbt");
        assert!(is_platform_default(&user, "login_name", &"DBT".into()));
        assert!(!is_platform_default(&user, "login_name", &"dbt@corp".into()));
        assert!(!is_platform_default(&user, "disabled", &"true".into()));
    }

    #[test]
    fn test_defaulted_params_are_observable() {
        for kind in reconcile::KIND_ORDER {
            for (param, _) in platform_defaults(kind) {
                assert!(is_observable(kind, param), "{kind}: {param}");
            }
        }
    }
}
