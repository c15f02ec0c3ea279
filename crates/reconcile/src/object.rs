//! Managed object model
//!
//! A [`ManagedObject`] is an immutable value: a kind, an upper-cased name and
//! an attribute mapping. Objects are rebuilt on every reconciliation pass from
//! either the spec document (desired state) or a live query (current state).

use crate::error::{Error, Result};
use crate::kind::ObjectKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Attribute value: a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Check if the value carries no content at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Whether a live value means "not set".
///
/// The live system reports unset attributes either as an empty string or as
/// the literal token `null`.
pub fn is_absent_value(value: &ParamValue) -> bool {
    match value {
        ParamValue::Text(s) => {
            let s = s.trim();
            s.is_empty() || s.eq_ignore_ascii_case("null")
        }
        ParamValue::List(items) => items.is_empty(),
    }
}

/// A database-level object under management
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ManagedObject {
    kind: ObjectKind,
    name: String,
    params: BTreeMap<String, ParamValue>,
}

/// Set of objects of one kind, as produced by the loader or the inspector
pub type ObjectSet = HashSet<ManagedObject>;

impl ManagedObject {
    /// Create an object, normalizing the name to upper case and keys to lower case
    pub fn new<K, V>(kind: ObjectKind, name: &str, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Self {
            kind,
            name: name.trim().to_uppercase(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Create an object with no attributes
    pub fn bare(kind: ObjectKind, name: &str) -> Self {
        Self::new(kind, name, std::iter::empty::<(String, ParamValue)>())
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Return a copy of this object with one extra attribute
    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_lowercase(), value.into());
        self
    }

    /// Return a copy keeping only the attributes whose key passes `keep`
    pub fn retain_params(mut self, keep: impl Fn(&str) -> bool) -> Self {
        self.params.retain(|k, _| keep(k));
        self
    }

    /// Required attributes that are absent or empty
    pub fn missing_required_params(&self) -> BTreeSet<String> {
        self.kind
            .required_params()
            .iter()
            .filter(|key| self.params.get(**key).is_none_or(ParamValue::is_empty))
            .map(|key| (*key).to_string())
            .collect()
    }

    /// Check that every required attribute is present and non-empty
    pub fn validate(&self) -> bool {
        self.missing_required_params().is_empty()
    }

    /// Validate the object, turning a failure into a configuration error
    pub fn ensure_valid(self) -> Result<Self> {
        if self.kind == ObjectKind::Schema && !is_qualified_schema_name(&self.name) {
            return Err(Error::InvalidSchemaName(self.name));
        }

        let missing = self.missing_required_params();
        if !missing.is_empty() {
            return Err(Error::MissingRequiredParams {
                kind: self.kind,
                name: self.name,
                missing: missing.into_iter().collect(),
            });
        }

        Ok(self)
    }
}

impl fmt::Display for ManagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

fn is_qualified_schema_name(name: &str) -> bool {
    matches!(name.split_once('.'), Some((db, schema)) if !db.is_empty() && !schema.is_empty() && !schema.contains('.'))
}
