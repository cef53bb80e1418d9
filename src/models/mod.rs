//! Domain models for the VPC topology.
//!
//! - [`Cidr`] - IPv4 CIDR block with mask arithmetic
//! - [`Resource`] and [`OutputRef`] - declared resources and the references wiring them together
//! - [`Tags`] - tag map attached to taggable resources

mod cidr;
mod resource;

use std::collections::BTreeMap;

// Re-export public types
pub use cidr::Cidr;
pub use resource::{OutputRef, Resource, ResourceKind};

/// Tags for one resource. Ordered so plans are stable.
pub type Tags = BTreeMap<String, String>;

/// Build a [`Tags`] map from string pairs.
pub fn tags<const N: usize>(pairs: [(&str, &str); N]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
