//! Topology builder.
//!
//! Declares the VPC and its shared routing, then one public subnet per zone,
//! plus a NAT gateway and private subnet per zone when the private tier is on,
//! plus a NACL protected subnet per zone when the protected tier is also on.

use super::exports::StackExports;
use super::graph::ResourceGraph;
use super::resolver::{ResolvedNetwork, SubnetTier};
use crate::models::{OutputRef, Resource, ResourceKind, Tags};
use serde_json::{json, Value};
use std::error::Error;

const ANYWHERE: &str = "0.0.0.0/0";
const ALL_PROTOCOLS: &str = "-1";
const NACL_RULE_NUMBER: u32 = 100;

/// The declared graph and the values it exports.
#[derive(Debug)]
pub struct Topology {
    pub graph: ResourceGraph,
    pub exports: StackExports,
}

/// DHCP domain for the region; `us-east-1` uses the legacy name.
pub fn dhcp_domain_name(region: &str) -> String {
    if region == "us-east-1" {
        "ec2.internal".to_string()
    } else {
        format!("{region}.compute.internal")
    }
}

/// Endpoint service name for S3 in the region.
pub fn s3_service_name(region: &str) -> String {
    format!("com.amazonaws.{region}.s3")
}

fn tags_value(tags: &Tags) -> Value {
    Value::Object(
        tags.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn name_tags(name: &str, network: &str) -> Value {
    json!({ "Name": name, "Network": network })
}

/// Configured tags for zone `i` with the `Name` tag set (Name wins).
fn subnet_tags(
    net: &ResolvedNetwork,
    tier: SubnetTier,
    i: usize,
    name: String,
) -> Result<Value, Box<dyn Error>> {
    let mut tags = zone_entry(net.tags(tier), tier, "tags", i, net.zones.len())?.clone();
    tags.insert("Name".to_string(), name);
    Ok(tags_value(&tags))
}

/// Entry `i` of a per-zone list; a short list is an error naming the tier.
fn zone_entry<'a, T>(
    values: Option<&'a [T]>,
    tier: SubnetTier,
    what: &str,
    i: usize,
    zone_count: usize,
) -> Result<&'a T, Box<dyn Error>> {
    let values = values.ok_or_else(|| format!("{tier} subnet {what} are not resolved"))?;
    values.get(i).ok_or_else(|| {
        format!(
            "{tier} subnet {what} has {} entries but {zone_count} zones are selected (missing index {i})",
            values.len()
        )
        .into()
    })
}

fn wildcard_policy() -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "*",
            "Effect": "Allow",
            "Resource": "*",
            "Principal": "*",
        }],
    })
    .to_string()
}

/// Declare route table, default route and association for one subnet.
fn declare_routing(
    graph: &mut ResourceGraph,
    prefix: &str,
    vpc_id: &OutputRef,
    subnet_id: &OutputRef,
    route_name: &str,
    network: &str,
    nat_gateway_id: &OutputRef,
) -> Result<OutputRef, Box<dyn Error>> {
    let route_table_id = graph
        .declare(
            Resource::new(format!("{prefix}RouteTable"), ResourceKind::RouteTable)
                .prop_ref("vpcId", vpc_id)
                .prop("tags", name_tags(route_name, network)),
        )?
        .id();
    graph.declare(
        Resource::new(format!("{prefix}Route"), ResourceKind::Route)
            .prop_ref("routeTableId", &route_table_id)
            .prop("destinationCidrBlock", ANYWHERE)
            .prop_ref("natGatewayId", nat_gateway_id),
    )?;
    graph.declare(
        Resource::new(
            format!("{prefix}RouteTableAssociation"),
            ResourceKind::RouteTableAssociation,
        )
        .prop_ref("subnetId", subnet_id)
        .prop_ref("routeTableId", &route_table_id),
    )?;
    Ok(route_table_id)
}

fn nacl_rule(name: String, acl_id: &OutputRef, egress: bool) -> Resource {
    Resource::new(name, ResourceKind::NetworkAclRule)
        .prop_ref("networkAclId", acl_id)
        .prop("cidrBlock", ANYWHERE)
        .prop("egress", egress)
        .prop("protocol", ALL_PROTOCOLS)
        .prop("ruleAction", "allow")
        .prop("ruleNumber", NACL_RULE_NUMBER)
}

/// Declare the whole topology for a resolved network.
///
/// Fails before anything is handed to the engine if a tier's CIDR or tag
/// list is shorter than the zone list.
pub fn build_topology(net: &ResolvedNetwork) -> Result<Topology, Box<dyn Error>> {
    let mut graph = ResourceGraph::new();
    let stack_name = net.stack_name();
    let zone_count = net.zones.len();

    let vpc = graph.declare(
        Resource::new("VPC", ResourceKind::Vpc)
            .prop("cidrBlock", net.vpc_cidr.as_str())
            .prop("instanceTenancy", net.vpc_tenancy.as_str())
            .prop("enableDnsSupport", true)
            .prop("enableDnsHostnames", true)
            .prop("tags", json!({ "Name": stack_name })),
    )?;
    let vpc_id = vpc.id();
    let vpc_cidr = vpc.output("cidrBlock");

    let dhcp_options_id = graph
        .declare(
            Resource::new("DHCPOptions", ResourceKind::VpcDhcpOptions)
                .prop("domainName", dhcp_domain_name(&net.region))
                .prop("domainNameServers", json!(["AmazonProvidedDNS"])),
        )?
        .id();
    graph.declare(
        Resource::new(
            "VPCDHCPOptionsAssociation",
            ResourceKind::VpcDhcpOptionsAssociation,
        )
        .prop_ref("vpcId", &vpc_id)
        .prop_ref("dhcpOptionsId", &dhcp_options_id),
    )?;

    let igw_id = graph
        .declare(
            Resource::new("InternetGateway", ResourceKind::InternetGateway)
                .prop_ref("vpcId", &vpc_id)
                .prop("tags", json!({ "Name": stack_name })),
        )?
        .id();

    let public_route_table_id = graph
        .declare(
            Resource::new("PublicSubnetRouteTable", ResourceKind::RouteTable)
                .prop_ref("vpcId", &vpc_id)
                .prop("tags", name_tags("Public Subnets", "Public")),
        )?
        .id();
    graph.declare(
        Resource::new("PublicSubnetRoute", ResourceKind::Route)
            .prop_ref("routeTableId", &public_route_table_id)
            .prop("destinationCidrBlock", ANYWHERE)
            .prop_ref("gatewayId", &igw_id),
    )?;

    let mut nat_eips = Vec::new();
    let mut public_subnet_ids = Vec::new();
    let mut private_subnet_ids = Vec::new();
    let mut protected_subnet_ids = Vec::new();
    let mut private_route_table_ids = Vec::new();

    for (i, az) in net.zones.iter().enumerate() {
        log::debug!("zone #{i} {az}");

        // Each zone gets a public subnet.
        let public_cidr = zone_entry(
            net.cidrs(SubnetTier::Public),
            SubnetTier::Public,
            "CIDRs",
            i,
            zone_count,
        )?;
        let public_subnet_id = graph
            .declare(
                Resource::new(format!("PublicSubnet{i}"), ResourceKind::Subnet)
                    .prop_ref("vpcId", &vpc_id)
                    .prop("availabilityZone", az.as_str())
                    .prop("cidrBlock", public_cidr.as_str())
                    .prop("mapPublicIpOnLaunch", true)
                    .prop(
                        "tags",
                        subnet_tags(net, SubnetTier::Public, i, format!("Public subnet {i}"))?,
                    ),
            )?
            .id();
        graph.declare(
            Resource::new(
                format!("PublicSubnet{i}RouteTableAssociation"),
                ResourceKind::RouteTableAssociation,
            )
            .prop_ref("subnetId", &public_subnet_id)
            .prop_ref("routeTableId", &public_route_table_id),
        )?;
        public_subnet_ids.push(public_subnet_id.clone());

        if !SubnetTier::Private.enabled(net.flags) {
            continue;
        }

        // The EIP cannot be allocated before the gateway is attached.
        let eip = graph.declare(
            Resource::new(format!("NAT{i}EIP"), ResourceKind::Eip)
                .prop("vpc", true)
                .depends_on(&igw_id.resource),
        )?;
        let eip_id = eip.id();
        nat_eips.push(eip.output("publicIp"));
        let nat_gateway_id = graph
            .declare(
                Resource::new(format!("NATGateway{i}"), ResourceKind::NatGateway)
                    .prop_ref("subnetId", &public_subnet_id)
                    .prop_ref("allocationId", &eip_id),
            )?
            .id();

        let private_cidr = zone_entry(
            net.cidrs(SubnetTier::Private),
            SubnetTier::Private,
            "CIDRs",
            i,
            zone_count,
        )?;
        let private_subnet_id = graph
            .declare(
                Resource::new(format!("PrivateSubnet{i}A"), ResourceKind::Subnet)
                    .prop_ref("vpcId", &vpc_id)
                    .prop("availabilityZone", az.as_str())
                    .prop("cidrBlock", private_cidr.as_str())
                    .prop(
                        "tags",
                        subnet_tags(net, SubnetTier::Private, i, format!("Private subnet {i}A"))?,
                    ),
            )?
            .id();
        private_subnet_ids.push(private_subnet_id.clone());
        private_route_table_ids.push(declare_routing(
            &mut graph,
            &format!("PrivateSubnet{i}A"),
            &vpc_id,
            &private_subnet_id,
            &format!("Private subnet {i}A"),
            "Private",
            &nat_gateway_id,
        )?);

        if !SubnetTier::Protected.enabled(net.flags) {
            continue;
        }

        let protected_cidr = zone_entry(
            net.cidrs(SubnetTier::Protected),
            SubnetTier::Protected,
            "CIDRs",
            i,
            zone_count,
        )?;
        let protected_subnet_id = graph
            .declare(
                Resource::new(format!("PrivateSubnet{i}B"), ResourceKind::Subnet)
                    .prop_ref("vpcId", &vpc_id)
                    .prop("availabilityZone", az.as_str())
                    .prop("cidrBlock", protected_cidr.as_str())
                    .prop(
                        "tags",
                        subnet_tags(net, SubnetTier::Protected, i, format!("Private subnet {i}B"))?,
                    ),
            )?
            .id();
        protected_subnet_ids.push(protected_subnet_id.clone());
        // Same NAT gateway as the zone's private subnet.
        private_route_table_ids.push(declare_routing(
            &mut graph,
            &format!("PrivateSubnet{i}B"),
            &vpc_id,
            &protected_subnet_id,
            &format!("Private subnet {i}B"),
            "Private",
            &nat_gateway_id,
        )?);

        // Allow-all placeholder rules; the ACL exists so it can be tightened later.
        let acl_id = graph
            .declare(
                Resource::new(format!("PrivateSubnet{i}BNetworkAcl"), ResourceKind::NetworkAcl)
                    .prop_ref("vpcId", &vpc_id)
                    .prop_refs("subnetIds", &[protected_subnet_id])
                    .prop(
                        "tags",
                        name_tags(&format!("NACL protected subnet {i}"), "NACL Protected"),
                    ),
            )?
            .id();
        graph.declare(nacl_rule(
            format!("PrivateSubnet{i}BNetworkAclEntryInbound"),
            &acl_id,
            false,
        ))?;
        graph.declare(nacl_rule(
            format!("PrivateSubnet{i}BNetworkAclEntryOutbound"),
            &acl_id,
            true,
        ))?;
    }

    let s3_vpc_endpoint_id = if SubnetTier::Private.enabled(net.flags) {
        let endpoint = graph.declare(
            Resource::new("S3VPCEndpoint", ResourceKind::VpcEndpoint)
                .prop_ref("vpcId", &vpc_id)
                .prop("policy", wildcard_policy())
                .prop_refs("routeTableIds", &private_route_table_ids)
                .prop("serviceName", s3_service_name(&net.region)),
        )?;
        Some(endpoint.id())
    } else {
        None
    };

    log::info!(
        "Declared {} resources for {} zones ({} public, {} private, {} protected subnets)",
        graph.len(),
        zone_count,
        public_subnet_ids.len(),
        private_subnet_ids.len(),
        protected_subnet_ids.len()
    );

    let exports = StackExports {
        vpc_id,
        vpc_cidr,
        net_eips: nat_eips,
        public_subnet_ids,
        public_subnet_cidrs: net.public_subnet_cidrs.clone(),
        public_subnet_route_table_id: public_route_table_id,
        private_subnet_ids,
        private_subnet_cidrs: net.private_subnet_cidrs.clone(),
        protected_subnet_ids,
        protected_subnet_cidrs: net.protected_subnet_cidrs.clone(),
        private_subnet_route_table_ids: private_route_table_ids,
        s3_vpc_endpoint_id,
    };

    Ok(Topology { graph, exports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::StaticZones;
    use crate::config::NetworkConfig;
    use crate::processing::resolve_network;
    use pretty_assertions::assert_eq;

    fn resolved(cfg: NetworkConfig) -> ResolvedNetwork {
        let provider = StaticZones::new(&["us-west-2a", "us-west-2b", "us-west-2c"]);
        resolve_network(&cfg, &provider).unwrap()
    }

    fn two_zones(private: bool, protected: bool) -> NetworkConfig {
        NetworkConfig {
            region: "us-west-2".to_string(),
            number_of_availability_zones: Some(2),
            create_private_subnets: private,
            create_protected_subnets: protected,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_two_zone_topology() {
        let topo = build_topology(&resolved(two_zones(true, true))).unwrap();
        let g = &topo.graph;
        let subnets: Vec<&str> = g.of_kind(ResourceKind::Subnet).map(|r| r.name.as_str()).collect();
        assert_eq!(
            subnets,
            vec![
                "PublicSubnet0",
                "PrivateSubnet0A",
                "PrivateSubnet0B",
                "PublicSubnet1",
                "PrivateSubnet1A",
                "PrivateSubnet1B"
            ]
        );
        assert_eq!(g.of_kind(ResourceKind::NatGateway).count(), 2);
        assert_eq!(g.of_kind(ResourceKind::Eip).count(), 2);
        assert_eq!(g.of_kind(ResourceKind::NetworkAcl).count(), 2);
        assert_eq!(g.of_kind(ResourceKind::NetworkAclRule).count(), 4);
        assert_eq!(g.of_kind(ResourceKind::VpcEndpoint).count(), 1);

        let endpoint = g.get("S3VPCEndpoint").unwrap();
        assert_eq!(
            endpoint.properties["routeTableIds"],
            json!([
                "${PrivateSubnet0ARouteTable.id}",
                "${PrivateSubnet0BRouteTable.id}",
                "${PrivateSubnet1ARouteTable.id}",
                "${PrivateSubnet1BRouteTable.id}"
            ])
        );
        assert_eq!(endpoint.properties["serviceName"], "com.amazonaws.us-west-2.s3");
        assert_eq!(topo.exports.private_subnet_route_table_ids.len(), 4);
        assert_eq!(topo.exports.s3_vpc_endpoint_id, Some(OutputRef::new("S3VPCEndpoint", "id")));
    }

    #[test]
    fn test_public_only() {
        let topo = build_topology(&resolved(two_zones(false, true))).unwrap();
        let g = &topo.graph;
        assert_eq!(g.of_kind(ResourceKind::Subnet).count(), 2);
        assert_eq!(g.of_kind(ResourceKind::NatGateway).count(), 0);
        assert_eq!(g.of_kind(ResourceKind::Eip).count(), 0);
        assert_eq!(g.of_kind(ResourceKind::VpcEndpoint).count(), 0);
        assert!(topo.exports.private_subnet_ids.is_empty());
        assert!(topo.exports.protected_subnet_ids.is_empty());
        assert_eq!(topo.exports.private_subnet_cidrs, None);
        assert_eq!(topo.exports.s3_vpc_endpoint_id, None);
    }

    #[test]
    fn test_eip_waits_for_internet_gateway() {
        let topo = build_topology(&resolved(two_zones(true, false))).unwrap();
        let eip = topo.graph.get("NAT1EIP").unwrap();
        assert!(eip.depends_on.contains("InternetGateway"));
        assert_eq!(eip.properties["vpc"], true);
        let nat = topo.graph.get("NATGateway1").unwrap();
        assert_eq!(nat.properties["subnetId"], "${PublicSubnet1.id}");
        assert_eq!(nat.properties["allocationId"], "${NAT1EIP.id}");
        assert_eq!(topo.exports.net_eips[1], OutputRef::new("NAT1EIP", "publicIp"));
    }

    #[test]
    fn test_protected_routes_share_zone_nat() {
        let topo = build_topology(&resolved(two_zones(true, true))).unwrap();
        let a = topo.graph.get("PrivateSubnet0ARoute").unwrap();
        let b = topo.graph.get("PrivateSubnet0BRoute").unwrap();
        assert_eq!(a.properties["natGatewayId"], "${NATGateway0.id}");
        assert_eq!(b.properties["natGatewayId"], "${NATGateway0.id}");
        assert_eq!(b.properties["destinationCidrBlock"], "0.0.0.0/0");
    }

    #[test]
    fn test_nacl_rules_reference_own_acl() {
        let topo = build_topology(&resolved(two_zones(true, true))).unwrap();
        for (name, egress) in [
            ("PrivateSubnet1BNetworkAclEntryInbound", false),
            ("PrivateSubnet1BNetworkAclEntryOutbound", true),
        ] {
            let rule = topo.graph.get(name).unwrap();
            assert_eq!(rule.properties["networkAclId"], "${PrivateSubnet1BNetworkAcl.id}");
            assert_eq!(rule.properties["egress"], egress);
            assert_eq!(rule.properties["protocol"], "-1");
            assert_eq!(rule.properties["ruleNumber"], 100);
            assert_eq!(rule.properties["ruleAction"], "allow");
        }
        let acl = topo.graph.get("PrivateSubnet1BNetworkAcl").unwrap();
        assert_eq!(acl.properties["subnetIds"], json!(["${PrivateSubnet1B.id}"]));
    }

    #[test]
    fn test_subnet_tags_name_wins() {
        let mut cfg = two_zones(true, false);
        cfg.public_subnet_tags = Some(vec![
            crate::models::tags([("Name", "ignored"), ("Team", "edge")]),
            crate::models::tags([("Team", "edge")]),
        ]);
        let topo = build_topology(&resolved(cfg)).unwrap();
        assert_eq!(
            topo.graph.get("PublicSubnet0").unwrap().properties["tags"],
            json!({ "Name": "Public subnet 0", "Team": "edge" })
        );
        assert_eq!(
            topo.graph.get("PrivateSubnet1A").unwrap().properties["tags"],
            json!({ "Name": "Private subnet 1A", "Network": "Private" })
        );
    }

    #[test]
    fn test_short_override_fails() {
        let mut cfg = two_zones(true, false);
        cfg.private_subnet_cidrs = Some(vec!["10.0.0.0/19".to_string()]);
        let err = build_topology(&resolved(cfg)).unwrap_err();
        assert!(err.to_string().contains("private subnet CIDRs has 1 entries"), "{err}");
    }

    #[test]
    fn test_more_than_four_zones_fails_on_default_cidrs() {
        let cfg = NetworkConfig {
            availability_zones: Some((0..5).map(|i| format!("eu-west-1-az{i}")).collect()),
            create_private_subnets: false,
            ..Default::default()
        };
        let net = resolve_network(&cfg, &StaticZones::default()).unwrap();
        assert_eq!(net.public_subnet_cidrs.len(), 4);
        assert_eq!(net.public_subnet_tags.len(), 5);
        let err = build_topology(&net).unwrap_err();
        assert!(err.to_string().contains("missing index 4"), "{err}");
    }

    #[test]
    fn test_dhcp_domain_name() {
        assert_eq!(dhcp_domain_name("us-east-1"), "ec2.internal");
        assert_eq!(dhcp_domain_name("eu-central-1"), "eu-central-1.compute.internal");
    }

    #[test]
    fn test_shared_resources() {
        let topo = build_topology(&resolved(two_zones(true, false))).unwrap();
        let vpc = topo.graph.get("VPC").unwrap();
        assert_eq!(vpc.properties["cidrBlock"], "10.0.0.0/16");
        assert_eq!(vpc.properties["tags"], json!({ "Name": "base-infra-dev" }));
        let route = topo.graph.get("PublicSubnetRoute").unwrap();
        assert_eq!(route.properties["gatewayId"], "${InternetGateway.id}");
        assert_eq!(topo.exports.vpc_cidr, OutputRef::new("VPC", "cidrBlock"));
        assert_eq!(topo.graph.apply_waves()[0], vec!["VPC", "DHCPOptions"]);
    }
}
