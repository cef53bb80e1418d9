//! Terminal output utilities.

use super::plan::Plan;
use crate::processing::{LayoutIssue, StackExports};
use colored::Colorize;
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// One printed line of the plan summary.
#[derive(Debug, PartialEq)]
pub struct SummaryRow {
    pub wave: usize,
    pub kind: String,
    pub name: String,
    pub depends_on: String,
}

/// Rows in apply order: by wave, then declaration order.
pub fn summary_rows(plan: &Plan) -> Vec<SummaryRow> {
    let wave_of: HashMap<&str, usize> = plan
        .waves
        .iter()
        .enumerate()
        .flat_map(|(w, names)| names.iter().map(move |n| (*n, w)))
        .collect();

    plan.resources
        .iter()
        .map(|r| SummaryRow {
            wave: wave_of.get(r.name.as_str()).copied().unwrap_or(0),
            kind: r.kind.type_token().to_string(),
            name: r.name.clone(),
            depends_on: r.depends_on.iter().join(" "),
        })
        .sorted_by_key(|row| row.wave)
        .collect()
}

/// Print the plan as quoted CSV rows followed by per-kind counts.
pub fn print_summary(plan: &Plan) {
    println!(
        "# {} {}/{} in {} [{}]",
        "PLAN".on_blue(),
        plan.project,
        plan.stack,
        plan.region,
        plan.zones.join(",")
    );
    println!(
        r#""wave",                                         "type",                         "name", "dependsOn""#
    );
    for row in summary_rows(plan) {
        println!(
            "{wave},{kind},{name},{deps}",
            wave = format_field(row.wave, 6),
            kind = format_field(&row.kind, 48),
            name = format_field(&row.name, 44),
            deps = format_field(&row.depends_on, 12),
        );
    }

    println!(
        "#{}# {} resources in {} waves",
        "TOTAL".on_green(),
        plan.resources.len(),
        plan.waves.len()
    );
    for (kind, n) in &plan.counts {
        println!("#   {n:3} x {kind}");
    }
}

/// Print the stack exports as pretty JSON.
pub fn print_exports(exports: &StackExports) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&exports.to_map()?)?;
    println!("{json}");
    Ok(())
}

/// Print layout issues; returns how many were printed.
pub fn print_issues(issues: &[LayoutIssue]) -> usize {
    if issues.is_empty() {
        println!("{} CIDR layout is clean", "OK".green());
    }
    for issue in issues {
        println!("{} {issue}", "ISSUE".on_red());
    }
    issues.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::StaticZones;
    use crate::config::NetworkConfig;
    use crate::processing::{build_topology, resolve_network};

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 6), "\"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("PrivateSubnet0BRouteTable", 5), "\"PrivateSubnet0BRouteTable\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(3, 6), "   \"3\"");
    }

    #[test]
    fn test_summary_rows_in_wave_order() {
        let cfg = NetworkConfig {
            availability_zones: Some(vec!["us-east-1a".into()]),
            create_private_subnets: false,
            ..Default::default()
        };
        let net = resolve_network(&cfg, &StaticZones::default()).unwrap();
        let topo = build_topology(&net).unwrap();
        let plan = Plan::new(&net, &topo);
        let rows = summary_rows(&plan);

        assert_eq!(rows.len(), topo.graph.len());
        assert!(rows.windows(2).all(|w| w[0].wave <= w[1].wave));
        assert_eq!(rows[0].name, "VPC");
        let assoc = rows
            .iter()
            .find(|r| r.name == "PublicSubnet0RouteTableAssociation")
            .unwrap();
        assert_eq!(assoc.wave, 2);
        assert_eq!(assoc.depends_on, "PublicSubnet0 PublicSubnetRouteTable");
    }
}
