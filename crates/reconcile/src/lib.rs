//! # Reconcile
//!
//! Reconciliation engine for warehouse access-control objects.
//!
//! This crate compares a desired set of objects (from a declarative spec)
//! with the current set (from live inspection) and produces the minimal,
//! ordered sequence of DDL statements that converges one into the other.
//!
//! ## Core Concepts
//!
//! - **ManagedObject**: An immutable kind + name + attributes value
//! - **resolve_objects**: Per-kind diff into create / drop / alter statements
//! - **build_statements_list**: Orders buckets by kind and splits every
//!   compound statement into atomic pieces
//! - **execute**: Runs atomic statements in order through a [`StatementRunner`]
//!
//! ## Example
//!
//! ```
//! use reconcile::{ManagedObject, ObjectKind, ObjectSet, resolve_objects};
//!
//! let current: ObjectSet = [ManagedObject::new(
//!     ObjectKind::Warehouse,
//!     "wh1",
//!     [("warehouse_size", "xsmall"), ("comment", "old")],
//! )]
//! .into_iter()
//! .collect();
//! let desired: ObjectSet = [ManagedObject::new(
//!     ObjectKind::Warehouse,
//!     "wh1",
//!     [("warehouse_size", "medium")],
//! )]
//! .into_iter()
//! .collect();
//!
//! let bucket = resolve_objects(&current, &desired, "SYSADMIN");
//! assert_eq!(bucket.alter.len(), 2);
//! ```
//!
//! The diff engine and sequencer perform no I/O. The only side effects live
//! behind [`StatementRunner`], [`ProgressCallback`] and [`ConfirmCallback`].

pub mod context;
pub mod ddl;
pub mod diff;
pub mod error;
pub mod executor;
pub mod kind;
pub mod object;
pub mod planner;
pub mod types;

// Re-export main types at crate root
pub use context::{
    AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback, StatementRunner,
};
pub use diff::{DiffSummary, StatementBucket, resolve_objects};
pub use error::{Error, Result};
pub use executor::{execute, execute_simple, is_context_switch};
pub use kind::{KIND_ORDER, ObjectKind};
pub use object::{ManagedObject, ObjectSet, ParamValue, is_absent_value};
pub use planner::{ReconciliationPlan, build_statements_list};
pub use types::{ExecuteOptions, ExecuteSummary, StatementOutcome};
