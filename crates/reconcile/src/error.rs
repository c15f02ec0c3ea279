//! Error types for the reconcile crate

use crate::kind::ObjectKind;
use thiserror::Error;

/// Errors that can occur while building or validating managed objects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A desired object lacks attributes its kind requires
    #[error("required parameters for {kind} '{name}' missing: {}", .missing.join(", "))]
    MissingRequiredParams {
        kind: ObjectKind,
        name: String,
        missing: Vec<String>,
    },

    /// Object kind name not recognized
    #[error("unknown object kind: {0}")]
    UnknownKind(String),

    /// Schema names must be qualified as DATABASE.SCHEMA
    #[error("invalid schema name '{0}': expected DATABASE.SCHEMA")]
    InvalidSchemaName(String),
}

/// Result type for reconcile operations
pub type Result<T> = std::result::Result<T, Error>;
