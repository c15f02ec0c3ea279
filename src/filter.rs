//! Objects floe never manages
//!
//! System objects of the live platform are always skipped; on top of that
//! the config can list glob patterns per kind. Rules apply to both the
//! current and the desired side, so an ignored object is never created,
//! altered or dropped.

use crate::config::IgnoreConfig;
use anyhow::{Context, Result};
use reconcile::{KIND_ORDER, ManagedObject, ObjectKind, ObjectSet};
use std::collections::HashMap;

/// Built-in patterns for platform-owned objects
fn builtin_patterns(kind: ObjectKind) -> &'static [&'static str] {
    match kind {
        ObjectKind::Warehouse => &[],
        ObjectKind::Database => &["SNOWFLAKE", "SNOWFLAKE_SAMPLE_DATA"],
        ObjectKind::Role => &[
            "ACCOUNTADMIN",
            "ORGADMIN",
            "PUBLIC",
            "SECURITYADMIN",
            "SYSADMIN",
            "USERADMIN",
        ],
        ObjectKind::User => &["SNOWFLAKE"],
        // Staging copies created by blue/green deploys end in _NEXT
        ObjectKind::Schema => &["*.INFORMATION_SCHEMA", "*.PUBLIC", "*_NEXT"],
    }
}

/// Compiled ignore patterns, matched against upper-cased names
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: HashMap<ObjectKind, Vec<glob::Pattern>>,
}

impl IgnoreRules {
    /// Built-in rules only
    #[cfg(test)]
    pub fn builtin() -> Self {
        Self::from_config(&IgnoreConfig::default()).unwrap_or_default()
    }

    /// Built-in rules plus the patterns from config
    pub fn from_config(config: &IgnoreConfig) -> Result<Self> {
        let mut patterns = HashMap::new();
        for kind in KIND_ORDER {
            let compiled = builtin_patterns(kind)
                .iter()
                .map(|p| (*p).to_string())
                .chain(config.patterns(kind).iter().cloned())
                .map(|p| {
                    glob::Pattern::new(&p.to_uppercase())
                        .with_context(|| format!("Invalid ignore pattern '{p}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            patterns.insert(kind, compiled);
        }
        Ok(Self { patterns })
    }

    pub fn is_ignored(&self, kind: ObjectKind, name: &str) -> bool {
        let name = name.to_uppercase();
        self.patterns
            .get(&kind)
            .is_some_and(|ps| ps.iter().any(|p| p.matches(&name)))
    }

    /// Drop ignored objects from a set
    pub fn retain(&self, objects: ObjectSet) -> ObjectSet {
        objects
            .into_iter()
            .filter(|o: &ManagedObject| {
                let ignored = self.is_ignored(o.kind(), o.name());
                if ignored {
                    log::debug!("Ignoring {o}");
                }
                !ignored
            })
            .collect()
    }
}
