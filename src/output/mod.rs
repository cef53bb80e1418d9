//! Output formatting for a declared topology.
//!
//! - [`plan`] - JSON plan document for the engine
//! - [`terminal`] - Human readable summary

mod plan;
mod terminal;

pub use plan::{plan_to_json, write_plan, Plan};
pub use terminal::{format_field, print_exports, print_issues, print_summary};
