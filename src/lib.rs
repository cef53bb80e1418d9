// cargo watch -x 'fmt' -x 'test'

//! Declares an AWS VPC topology (subnet tiers per availability zone, NAT,
//! routing, NACLs, S3 endpoint) as a dependency-ordered resource graph plus
//! the stack exports downstream stacks consume.

pub mod aws;
pub mod config;
pub mod models;
pub mod output;
pub mod processing;

use aws::ZoneProvider;
use config::{read_stack_config, NetworkConfig};
use processing::{build_topology, resolve_network, ResolvedNetwork, Topology};
use std::error::Error;

/// Read a stack file into a [`NetworkConfig`].
pub fn load_network_config(path: &str) -> Result<NetworkConfig, Box<dyn Error>> {
    let store = read_stack_config(path)?;
    NetworkConfig::from_store(&store)
}

/// Resolve the configuration and declare the topology in one pass.
///
/// Nothing is returned unless the whole pass succeeds.
pub fn plan_network(
    cfg: &NetworkConfig,
    provider: &dyn ZoneProvider,
) -> Result<(ResolvedNetwork, Topology), Box<dyn Error>> {
    let net = resolve_network(cfg, provider)?;
    let topology = build_topology(&net)?;
    Ok((net, topology))
}
