//! Reconciliation engine for floe
//!
//! The engine orchestrates:
//! 1. Planning - inspect the account and diff it against the spec, per kind
//! 2. Display - show the statements grouped by kind
//! 3. Executing - run the atomic statements in order

pub mod differ;
pub mod executor;
pub mod planner;

pub use differ::{display_plan, display_statements};
pub use executor::{ApplyOptions, apply};
pub use planner::build_plan;
