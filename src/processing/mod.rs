//! Network resolution and topology construction.
//!
//! - [`resolver`] - Zone, CIDR and tag resolution with defaults
//! - [`graph`] - Dependency-ordered resource graph
//! - [`topology`] - Declares the VPC topology into a graph
//! - [`exports`] - Stack outputs for downstream consumers
//! - [`layout`] - On-demand CIDR layout check

mod exports;
mod graph;
mod layout;
mod resolver;
mod topology;

// Re-export public types and functions
pub use exports::{StackExports, EXPORT_KEYS};
pub use graph::ResourceGraph;
pub use layout::{check_layout, log_layout_issues, LayoutIssue};
pub use resolver::{
    resolve_network, resolve_tier_cidrs, resolve_tier_tags, resolve_zones, ResolvedNetwork,
    SubnetTier, TierFlags, DEFAULT_PRIVATE_SUBNET_CIDRS, DEFAULT_PROTECTED_SUBNET_CIDRS,
    DEFAULT_PUBLIC_SUBNET_CIDRS,
};
pub use topology::{build_topology, dhcp_domain_name, s3_service_name, Topology};
