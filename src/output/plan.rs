//! JSON plan document handed to the engine.

use crate::models::{Resource, ResourceKind};
use crate::processing::{ResolvedNetwork, StackExports, Topology};
use serde::Serialize;
use std::error::Error;

/// Everything the engine needs to apply one stack.
#[derive(Serialize, Debug)]
pub struct Plan<'a> {
    pub project: &'a str,
    pub stack: &'a str,
    pub region: &'a str,
    pub zones: &'a [String],
    /// Declaration order; every dependency precedes its dependents.
    pub resources: &'a [Resource],
    /// Resource names grouped by apply wave.
    pub waves: Vec<Vec<&'a str>>,
    pub exports: &'a StackExports,
    /// Resources per kind, for the summary footer.
    #[serde(skip)]
    pub counts: Vec<(ResourceKind, usize)>,
}

impl<'a> Plan<'a> {
    pub fn new(net: &'a ResolvedNetwork, topo: &'a Topology) -> Plan<'a> {
        Plan {
            project: &net.project,
            stack: &net.stack,
            region: &net.region,
            zones: &net.zones,
            resources: topo.graph.resources(),
            waves: topo.graph.apply_waves(),
            exports: &topo.exports,
            counts: topo.graph.count_by_kind(),
        }
    }
}

/// Serialise the plan as pretty JSON.
pub fn plan_to_json(plan: &Plan) -> Result<String, Box<dyn Error>> {
    serde_json::to_string_pretty(plan).map_err(|e| format!("Error serializing plan: {e}").into())
}

/// Write the plan file.
pub fn write_plan(path: &str, plan: &Plan) -> Result<(), Box<dyn Error>> {
    let json = plan_to_json(plan)?;
    std::fs::write(path, json).map_err(|e| format!("Error writing plan {path}: {e}"))?;
    log::info!(
        "Wrote plan with {} resources in {} waves to {path}",
        plan.resources.len(),
        plan.waves.len()
    );
    Ok(())
}
