//! Stack outputs consumed by downstream stacks.
//!
//! Key names and shapes are a contract: downstream stacks look them up by
//! exact name.

use crate::models::OutputRef;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;

/// Exported keys, in output order.
pub const EXPORT_KEYS: [&str; 12] = [
    "vpcId",
    "vpcCidr",
    "netEips",
    "publicSubnetIds",
    "publicSubnetCidrs",
    "publicSubnetRouteTableId",
    "privateSubnetIds",
    "privateSubnetCidrs",
    "protectedSubnetIds",
    "protectedSubnetCidrs",
    "privateSubnetRouteTableIds",
    "s3VpcEndpointId",
];

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackExports {
    pub vpc_id: OutputRef,
    pub vpc_cidr: OutputRef,
    /// Public IPs of the NAT elastic IPs.
    pub net_eips: Vec<OutputRef>,
    pub public_subnet_ids: Vec<OutputRef>,
    pub public_subnet_cidrs: Vec<String>,
    pub public_subnet_route_table_id: OutputRef,
    pub private_subnet_ids: Vec<OutputRef>,
    /// `None` when private subnets are disabled.
    pub private_subnet_cidrs: Option<Vec<String>>,
    pub protected_subnet_ids: Vec<OutputRef>,
    pub protected_subnet_cidrs: Option<Vec<String>>,
    /// Private and protected route tables, zone by zone.
    pub private_subnet_route_table_ids: Vec<OutputRef>,
    pub s3_vpc_endpoint_id: Option<OutputRef>,
}

impl StackExports {
    /// Flatten into a name to value map.
    pub fn to_map(&self) -> Result<Map<String, Value>, Box<dyn Error>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(format!("Exports did not serialize to an object: {other}").into()),
        }
    }
}
