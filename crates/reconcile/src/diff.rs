//! Diff computation between current and desired object sets

use crate::ddl;
use crate::object::{ManagedObject, ObjectSet, is_absent_value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Statements generated for one object kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementBucket {
    pub create: Vec<String>,
    pub drop: Vec<String>,
    pub alter: Vec<String>,
}

impl StatementBucket {
    /// Total number of compound statements in the bucket
    pub fn len(&self) -> usize {
        self.create.len() + self.drop.len() + self.alter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy for display, secret literals masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |list: &[String]| list.iter().map(|s| ddl::redact(s)).collect();
        Self {
            create: mask(&self.create),
            drop: mask(&self.drop),
            alter: mask(&self.alter),
        }
    }
}

fn index_by_name(objects: &ObjectSet) -> BTreeMap<&str, &ManagedObject> {
    objects.iter().map(|o| (o.name(), o)).collect()
}

/// Compute the statements that converge `current` into `desired`.
///
/// Both sets must hold objects of a single kind, with unique names. Objects
/// are matched by name: a name on both sides is altered attribute by
/// attribute, never dropped and recreated. Output is sorted by name and then
/// by attribute key.
pub fn resolve_objects(current: &ObjectSet, desired: &ObjectSet, role: &str) -> StatementBucket {
    debug_assert!(
        current
            .iter()
            .chain(desired.iter())
            .map(ManagedObject::kind)
            .collect::<BTreeSet<_>>()
            .len()
            <= 1,
        "resolve_objects called with mixed kinds"
    );

    let current_by_name = index_by_name(current);
    let desired_by_name = index_by_name(desired);

    let current_names: BTreeSet<&str> = current_by_name.keys().copied().collect();
    let desired_names: BTreeSet<&str> = desired_by_name.keys().copied().collect();

    let mut bucket = StatementBucket::default();

    for name in desired_names.difference(&current_names) {
        bucket.create.push(ddl::create(desired_by_name[name], role));
    }

    for name in current_names.difference(&desired_names) {
        let object = current_by_name[name];
        bucket.drop.push(ddl::drop(object.kind(), object.name(), role));
    }

    for name in current_names.intersection(&desired_names) {
        bucket
            .alter
            .extend(alter_statements(current_by_name[name], desired_by_name[name], role));
    }

    log::debug!(
        "resolved {} create, {} drop, {} alter",
        bucket.create.len(),
        bucket.drop.len(),
        bucket.alter.len()
    );

    bucket
}

/// Per-attribute SET/UNSET statements for a matched pair
fn alter_statements(current: &ManagedObject, desired: &ManagedObject, role: &str) -> Vec<String> {
    let kind = desired.kind();
    let name = desired.name();
    let mut statements = Vec::new();

    for (key, value) in desired.params() {
        if kind.is_create_only(key) {
            continue;
        }
        if current.param(key) != Some(value) {
            statements.push(ddl::alter_set(kind, name, key, value, role));
        }
    }

    for (key, value) in current.params() {
        if desired.param(key).is_none() && !is_absent_value(value) {
            statements.push(ddl::alter_unset(kind, name, key, role));
        }
    }

    statements
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Number of objects to create
    pub creates: usize,
    /// Number of objects to drop
    pub drops: usize,
    /// Number of attribute changes
    pub alters: usize,
}

impl DiffSummary {
    /// Create a summary from a collection of buckets
    pub fn from_buckets<'a>(buckets: impl IntoIterator<Item = &'a StatementBucket>) -> Self {
        let mut summary = Self::default();
        for bucket in buckets {
            summary.creates += bucket.create.len();
            summary.drops += bucket.drop.len();
            summary.alters += bucket.alter.len();
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.drops + self.alters
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
