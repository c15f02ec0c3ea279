//! Object kinds and their per-kind tables

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a managed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Warehouse,
    Database,
    Role,
    User,
    Schema,
}

/// Dependency order used for a reconciliation pass.
///
/// Roles and warehouses exist before the users that default to them,
/// databases before the schemas they contain.
pub const KIND_ORDER: [ObjectKind; 5] = [
    ObjectKind::Warehouse,
    ObjectKind::Database,
    ObjectKind::Role,
    ObjectKind::User,
    ObjectKind::Schema,
];

impl ObjectKind {
    /// Lowercase singular name ("warehouse")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Database => "database",
            Self::Role => "role",
            Self::User => "user",
            Self::Schema => "schema",
        }
    }

    /// Lowercase plural name, as used for top-level spec keys ("warehouses")
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouses",
            Self::Database => "databases",
            Self::Role => "roles",
            Self::User => "users",
            Self::Schema => "schemas",
        }
    }

    /// SQL object keyword used in DDL templates
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Warehouse => "WAREHOUSE",
            Self::Database => "DATABASE",
            Self::Role => "ROLE",
            Self::User => "USER",
            Self::Schema => "SCHEMA",
        }
    }

    /// Attributes that must be present with a non-empty value
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Self::Warehouse => &["warehouse_size"],
            Self::Database | Self::Role | Self::User | Self::Schema => &[],
        }
    }

    /// Attributes sent on CREATE but never compared afterwards.
    ///
    /// The live system does not report these back, so diffing them would
    /// re-issue a SET on every run.
    pub fn create_only_params(&self) -> &'static [&'static str] {
        match self {
            Self::User => &["password", "must_change_password"],
            _ => &[],
        }
    }

    /// Whether objects of this kind accept attributes in DDL
    pub fn accepts_params(&self) -> bool {
        !matches!(self, Self::Schema)
    }

    pub fn is_create_only(&self, param: &str) -> bool {
        self.create_only_params().contains(&param)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        KIND_ORDER
            .into_iter()
            .find(|k| k.as_str() == lower || k.plural() == lower)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}
