//! CIDR layout check.
//!
//! The builder trusts its inputs; this check is run on demand to catch the
//! mistakes the engine would only reject at apply time.

use super::resolver::{ResolvedNetwork, SubnetTier};
use crate::models::Cidr;
use std::fmt;

/// One problem found in a resolved network's address plan.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutIssue {
    /// A CIDR string that does not parse.
    Unparseable { what: String, cidr: String },
    /// An address with host bits set, e.g. 10.0.1.0/16.
    NotAligned { what: String, cidr: Cidr },
    /// A subnet not contained in the VPC block.
    OutsideVpc { what: String, cidr: Cidr, vpc: Cidr },
    /// Two subnets sharing addresses.
    Overlap { a: String, b: String },
    /// A tier list that does not have one entry per zone.
    LengthMismatch {
        tier: SubnetTier,
        what: &'static str,
        len: usize,
        zones: usize,
    },
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutIssue::Unparseable { what, cidr } => {
                write!(f, "{what}: cannot parse CIDR '{cidr}'")
            }
            LayoutIssue::NotAligned { what, cidr } => write!(
                f,
                "{what}: {cidr} is not a network address (expected {}/{})",
                cidr.lo(),
                cidr.mask
            ),
            LayoutIssue::OutsideVpc { what, cidr, vpc } => {
                write!(f, "{what}: {cidr} is outside VPC {vpc}")
            }
            LayoutIssue::Overlap { a, b } => write!(f, "{a} overlaps {b}"),
            LayoutIssue::LengthMismatch { tier, what, len, zones } => {
                write!(f, "{tier} subnet {what}: {len} entries for {zones} zones")
            }
        }
    }
}

fn parse(what: String, cidr: &str, issues: &mut Vec<LayoutIssue>) -> Option<Cidr> {
    match Cidr::new(cidr) {
        Ok(c) => {
            if !c.is_network_aligned() {
                issues.push(LayoutIssue::NotAligned {
                    what: what.clone(),
                    cidr: c,
                });
            }
            Some(c)
        }
        Err(_) => {
            issues.push(LayoutIssue::Unparseable {
                what,
                cidr: cidr.to_string(),
            });
            None
        }
    }
}

/// Check the resolved address plan.
///
/// # Returns
/// Every issue found, in tier then zone order; empty when the plan is clean.
pub fn check_layout(net: &ResolvedNetwork) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();
    let zones = net.zones.len();

    let vpc = parse("VPC".to_string(), &net.vpc_cidr, &mut issues);

    let mut subnets: Vec<(String, Cidr)> = Vec::new();
    for tier in SubnetTier::ALL {
        if let Some(cidrs) = net.cidrs(tier) {
            if cidrs.len() != zones {
                issues.push(LayoutIssue::LengthMismatch {
                    tier,
                    what: "CIDRs",
                    len: cidrs.len(),
                    zones,
                });
            }
            for (i, cidr) in cidrs.iter().enumerate() {
                let what = format!("{tier} subnet {i}");
                if let Some(c) = parse(what.clone(), cidr, &mut issues) {
                    subnets.push((what, c));
                }
            }
        }
        if let Some(tags) = net.tags(tier) {
            if tags.len() != zones {
                issues.push(LayoutIssue::LengthMismatch {
                    tier,
                    what: "tags",
                    len: tags.len(),
                    zones,
                });
            }
        }
    }

    if let Some(vpc) = vpc {
        for (what, cidr) in &subnets {
            if !vpc.contains(cidr) {
                issues.push(LayoutIssue::OutsideVpc {
                    what: what.clone(),
                    cidr: *cidr,
                    vpc,
                });
            }
        }
    }

    for (i, (a_name, a)) in subnets.iter().enumerate() {
        for (b_name, b) in subnets.iter().skip(i + 1) {
            if a.overlaps(b) {
                issues.push(LayoutIssue::Overlap {
                    a: format!("{a_name} ({a})"),
                    b: format!("{b_name} ({b})"),
                });
            }
        }
    }

    issues
}

/// Log layout issues as warnings.
pub fn log_layout_issues(issues: &[LayoutIssue]) {
    if issues.is_empty() {
        log::info!("No CIDR layout issues found.");
        return;
    }
    log::warn!("Found {} CIDR layout issue(s):", issues.len());
    for issue in issues {
        log::warn!("  - {issue}");
    }
}
