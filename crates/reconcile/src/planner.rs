//! Statement sequencing - flattens per-kind buckets into an executable list

use crate::ddl::split_statement;
use crate::diff::{DiffSummary, StatementBucket};
use crate::kind::{KIND_ORDER, ObjectKind};
use std::collections::HashMap;

/// Flatten per-kind buckets into one ordered list of atomic statements.
///
/// Kinds are visited in `kind_order`; within a kind drops come first, then
/// creates, then alters. Every compound statement expands into its
/// context-switch and action pieces. Kinds without a bucket contribute nothing.
pub fn build_statements_list(
    buckets: &HashMap<ObjectKind, StatementBucket>,
    kind_order: &[ObjectKind],
) -> Vec<String> {
    let mut statements = Vec::new();

    for kind in kind_order {
        let Some(bucket) = buckets.get(kind) else {
            continue;
        };
        for statement in bucket.drop.iter().chain(&bucket.create).chain(&bucket.alter) {
            statements.extend(split_statement(statement));
        }
    }

    statements
}

/// A reconciliation plan: statement buckets keyed by kind plus the kind order
#[derive(Debug, Clone)]
pub struct ReconciliationPlan {
    buckets: HashMap<ObjectKind, StatementBucket>,
    kind_order: Vec<ObjectKind>,
}

impl ReconciliationPlan {
    /// Create an empty plan using the default dependency order
    pub fn new() -> Self {
        Self::with_order(&KIND_ORDER)
    }

    /// Create an empty plan with an explicit kind order
    pub fn with_order(kind_order: &[ObjectKind]) -> Self {
        Self {
            buckets: HashMap::new(),
            kind_order: kind_order.to_vec(),
        }
    }

    /// Set the bucket for a kind, replacing any previous one
    pub fn insert(&mut self, kind: ObjectKind, bucket: StatementBucket) {
        self.buckets.insert(kind, bucket);
    }

    pub fn bucket(&self, kind: ObjectKind) -> Option<&StatementBucket> {
        self.buckets.get(&kind)
    }

    pub fn kind_order(&self) -> &[ObjectKind] {
        &self.kind_order
    }

    /// Buckets in plan order, skipping kinds without one
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKind, &StatementBucket)> {
        self.kind_order
            .iter()
            .filter_map(|kind| self.buckets.get(kind).map(|b| (*kind, b)))
    }

    /// Restrict the plan to the given kinds
    pub fn retain_kinds(mut self, kinds: &[ObjectKind]) -> Self {
        self.kind_order.retain(|k| kinds.contains(k));
        self.buckets.retain(|k, _| kinds.contains(k));
        self
    }

    /// Remove every DROP statement from the plan
    pub fn without_drops(mut self) -> Self {
        for bucket in self.buckets.values_mut() {
            let dropped = std::mem::take(&mut bucket.drop);
            if !dropped.is_empty() {
                log::info!("Skipping {} drop statements", dropped.len());
            }
        }
        self
    }

    /// Ordered atomic statements ready for execution
    pub fn statements(&self) -> Vec<String> {
        build_statements_list(&self.buckets, &self.kind_order)
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_buckets(self.iter().map(|(_, b)| b))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, b)| b.is_empty())
    }
}

impl Default for ReconciliationPlan {
    fn default() -> Self {
        Self::new()
    }
}
