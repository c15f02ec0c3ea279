//! Spec loader - builds the desired state from a Permifrost-style YAML document
//!
//! Warehouses, databases, roles and users are listed explicitly. Schemas are
//! not: they are inferred from the schemas roles own or hold privileges on.

use anyhow::{Context, Result, bail};
use reconcile::{KIND_ORDER, ManagedObject, ObjectKind, ObjectSet, ParamValue};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use crate::normalize::normalize_value;
use crate::password::PasswordGenerator;

// ============================================================================
// Document Schema
// ============================================================================

/// One list entry: a single-key mapping from object name to its definition
type Entries = Vec<BTreeMap<String, Option<EntrySpec>>>;

#[derive(Debug, Default, Deserialize)]
struct SpecDocument {
    #[serde(default)]
    warehouses: Entries,
    #[serde(default)]
    databases: Entries,
    #[serde(default)]
    roles: Entries,
    #[serde(default)]
    users: Entries,
}

impl SpecDocument {
    fn entries(&self, kind: ObjectKind) -> &Entries {
        static EMPTY: Entries = Vec::new();
        match kind {
            ObjectKind::Warehouse => &self.warehouses,
            ObjectKind::Database => &self.databases,
            ObjectKind::Role => &self.roles,
            ObjectKind::User => &self.users,
            ObjectKind::Schema => &EMPTY,
        }
    }
}

/// Only the parts of an entry floe manages; grants and memberships are ignored
#[derive(Debug, Default, Deserialize)]
struct EntrySpec {
    #[serde(default)]
    meta: BTreeMap<String, Value>,
    #[serde(default)]
    owns: Option<OwnsSpec>,
    #[serde(default)]
    privileges: Option<PrivilegesSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct OwnsSpec {
    #[serde(default)]
    schemas: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PrivilegesSpec {
    #[serde(default)]
    schemas: Option<ReadWrite>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadWrite {
    #[serde(default)]
    read: Vec<String>,
    #[serde(default)]
    write: Vec<String>,
}

// ============================================================================
// Desired State
// ============================================================================

/// Desired objects per kind
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    objects: HashMap<ObjectKind, ObjectSet>,
}

impl DesiredState {
    pub fn get(&self, kind: ObjectKind) -> ObjectSet {
        self.objects.get(&kind).cloned().unwrap_or_default()
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.get(&kind).map_or(0, HashSet::len)
    }
}

/// Read and parse a spec file
pub fn load_spec(path: &Path, passwords: &dyn PasswordGenerator) -> Result<DesiredState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read spec file: {}", path.display()))?;
    parse_spec(&content, passwords).with_context(|| format!("Invalid spec file: {}", path.display()))
}

/// Parse spec content into a validated desired state.
///
/// Every object is validated; the first invalid object aborts loading so no
/// statement is ever generated from a broken spec.
pub fn parse_spec(content: &str, passwords: &dyn PasswordGenerator) -> Result<DesiredState> {
    let doc: SpecDocument = serde_yaml::from_str(content).context("Invalid YAML in spec")?;

    let mut objects = HashMap::new();
    for kind in KIND_ORDER {
        let parsed = match kind {
            ObjectKind::Schema => infer_schemas(&doc.roles)?,
            ObjectKind::User => synthesize_passwords(parse_entries(kind, doc.entries(kind))?, passwords),
            _ => parse_entries(kind, doc.entries(kind))?,
        };

        let mut validated = ObjectSet::new();
        for object in parsed {
            validated.insert(object.ensure_valid()?);
        }
        log::debug!("Loaded {} {}", validated.len(), kind.plural());
        objects.insert(kind, validated);
    }

    Ok(DesiredState { objects })
}

fn parse_entries(kind: ObjectKind, entries: &Entries) -> Result<Vec<ManagedObject>> {
    let mut seen = HashSet::new();
    let mut objects = Vec::new();

    for entry in entries {
        if entry.len() != 1 {
            bail!(
                "Each {} entry must be a single-key mapping, found keys: {}",
                kind,
                entry.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        for (name, spec) in entry {
            let mut params = BTreeMap::new();
            if let Some(spec) = spec {
                for (key, value) in &spec.meta {
                    let key = key.to_lowercase();
                    if let Some(value) = param_value(&key, value)
                        .with_context(|| format!("Invalid meta.{key} for {kind} '{name}'"))?
                    {
                        params.insert(key, value);
                    }
                }
            }

            let object = ManagedObject::new(kind, name, params);
            if !seen.insert(object.name().to_string()) {
                bail!("Duplicate {} name: {}", kind, object.name());
            }
            objects.push(object);
        }
    }

    Ok(objects)
}

/// Convert a YAML meta value into an attribute value; null means "not set"
fn param_value(key: &str, value: &Value) -> Result<Option<ParamValue>> {
    let value = match value {
        Value::Null => return Ok(None),
        Value::Sequence(items) => ParamValue::List(
            items
                .iter()
                .map(|item| scalar_text(key, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        other => ParamValue::Text(scalar_text(key, other)?),
    };
    Ok(Some(value))
}

fn scalar_text(key: &str, value: &Value) -> Result<String> {
    let text = match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => bail!("expected a scalar value"),
    };
    Ok(normalize_value(key, &text))
}

/// Give every user without a password a generated one.
///
/// The generated password must be changed on first login.
pub fn synthesize_passwords(
    users: Vec<ManagedObject>,
    passwords: &dyn PasswordGenerator,
) -> Vec<ManagedObject> {
    users
        .into_iter()
        .map(|user| {
            if user.param("password").is_some() {
                return user;
            }
            log::debug!("Generating password for user {}", user.name());
            user.with_param("password", passwords.generate())
                .with_param("must_change_password", "true")
        })
        .collect()
}

/// Schemas that must exist according to role ownership and privileges.
///
/// Entries are `database.schema`; wildcard schemas (`database.*`) refer to
/// whatever exists and do not declare anything.
fn infer_schemas(roles: &Entries) -> Result<Vec<ManagedObject>> {
    let mut names = BTreeSet::new();

    for entry in roles {
        for (role, spec) in entry {
            let Some(spec) = spec else { continue };

            let owned = spec.owns.iter().flat_map(|o| o.schemas.iter());
            let privileged = spec
                .privileges
                .iter()
                .filter_map(|p| p.schemas.as_ref())
                .flat_map(|rw| rw.read.iter().chain(rw.write.iter()));

            for schema in owned.chain(privileged) {
                let upper = schema.trim().to_uppercase();
                let Some((database, name)) = upper.split_once('.') else {
                    bail!("Role '{role}' references schema '{schema}' without a database");
                };
                if name == "*" {
                    continue;
                }
                names.insert(format!("{database}.{name}"));
            }
        }
    }

    Ok(names
        .into_iter()
        .map(|name| ManagedObject::bare(ObjectKind::Schema, &name))
        .collect())
}
