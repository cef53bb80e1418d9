//! Zone, CIDR and tag resolution.
//!
//! Each derived value follows the same precedence: explicit override, then
//! the built-in default, with the private and protected tiers collapsing to
//! `None` when their creation flags are off.

use crate::aws::ZoneProvider;
use crate::config::NetworkConfig;
use crate::models::{tags, Tags};
use std::error::Error;
use std::fmt;

/// Default public subnet blocks, one per zone.
pub const DEFAULT_PUBLIC_SUBNET_CIDRS: [&str; 4] =
    ["10.0.128.0/20", "10.0.144.0/20", "10.0.160.0/20", "10.0.176.0/20"];
/// Default private subnet blocks, one per zone.
pub const DEFAULT_PRIVATE_SUBNET_CIDRS: [&str; 4] =
    ["10.0.0.0/19", "10.0.32.0/19", "10.0.64.0/19", "10.0.96.0/19"];
/// Default NACL protected subnet blocks, one per zone.
pub const DEFAULT_PROTECTED_SUBNET_CIDRS: [&str; 4] =
    ["10.0.192.0/21", "10.0.200.0/21", "10.0.208.0/21", "10.0.216.0/21"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetTier {
    Public,
    Private,
    Protected,
}

impl SubnetTier {
    pub const ALL: [SubnetTier; 3] = [
        SubnetTier::Public,
        SubnetTier::Private,
        SubnetTier::Protected,
    ];

    /// Built-in CIDR table. Only covers four zones.
    pub fn default_cidrs(&self) -> &'static [&'static str; 4] {
        match self {
            SubnetTier::Public => &DEFAULT_PUBLIC_SUBNET_CIDRS,
            SubnetTier::Private => &DEFAULT_PRIVATE_SUBNET_CIDRS,
            SubnetTier::Protected => &DEFAULT_PROTECTED_SUBNET_CIDRS,
        }
    }

    /// Value of the `Network` tag applied when no tags are configured.
    pub fn default_label(&self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::Private | SubnetTier::Protected => "Private",
        }
    }

    /// Whether the tier is built at all under the given flags.
    pub fn enabled(&self, flags: TierFlags) -> bool {
        match self {
            SubnetTier::Public => true,
            SubnetTier::Private => flags.create_private_subnets,
            SubnetTier::Protected => flags.create_private_subnets && flags.create_protected_subnets,
        }
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubnetTier::Public => "public",
            SubnetTier::Private => "private",
            SubnetTier::Protected => "protected",
        };
        f.write_str(name)
    }
}

/// The two creation flags gating the private and protected tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierFlags {
    pub create_private_subnets: bool,
    pub create_protected_subnets: bool,
}

impl From<&NetworkConfig> for TierFlags {
    fn from(cfg: &NetworkConfig) -> TierFlags {
        TierFlags {
            create_private_subnets: cfg.create_private_subnets,
            create_protected_subnets: cfg.create_protected_subnets,
        }
    }
}

/// Pick the zones to build in.
///
/// A non-empty explicit list wins verbatim. Otherwise a non-zero `count`
/// takes that many provider zones (fewer if the region has fewer), else all.
pub fn resolve_zones(
    explicit: Option<&[String]>,
    count: Option<usize>,
    provider_zones: &[String],
) -> Vec<String> {
    if let Some(zones) = explicit.filter(|z| !z.is_empty()) {
        return zones.to_vec();
    }
    match count {
        Some(n) if n > 0 => provider_zones.iter().take(n).cloned().collect(),
        _ => provider_zones.to_vec(),
    }
}

/// CIDR blocks for a tier, one per zone, or `None` when the tier is off.
///
/// An explicit list is returned as given. The default is truncated from a
/// four-entry table, so more than four zones yield only four blocks.
pub fn resolve_tier_cidrs(
    tier: SubnetTier,
    flags: TierFlags,
    explicit: Option<&[String]>,
    zones: &[String],
) -> Option<Vec<String>> {
    if !tier.enabled(flags) {
        return None;
    }
    if let Some(cidrs) = explicit.filter(|c| !c.is_empty()) {
        return Some(cidrs.to_vec());
    }
    Some(
        tier.default_cidrs()
            .iter()
            .take(zones.len())
            .map(|c| c.to_string())
            .collect(),
    )
}

/// Tag maps for a tier, one per zone, or `None` when the tier is off.
///
/// The default label is repeated for every zone, so it always matches the
/// zone count.
pub fn resolve_tier_tags(
    tier: SubnetTier,
    flags: TierFlags,
    explicit: Option<&[Tags]>,
    zones: &[String],
) -> Option<Vec<Tags>> {
    if !tier.enabled(flags) {
        return None;
    }
    if let Some(t) = explicit.filter(|t| !t.is_empty()) {
        return Some(t.to_vec());
    }
    Some(vec![tags([("Network", tier.default_label())]); zones.len()])
}

/// Every value the builder needs, derived once from a [`NetworkConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNetwork {
    pub project: String,
    pub stack: String,
    pub region: String,
    pub vpc_cidr: String,
    pub vpc_tenancy: String,
    pub flags: TierFlags,
    pub zones: Vec<String>,
    pub public_subnet_cidrs: Vec<String>,
    pub public_subnet_tags: Vec<Tags>,
    pub private_subnet_cidrs: Option<Vec<String>>,
    pub private_subnet_tags: Option<Vec<Tags>>,
    pub protected_subnet_cidrs: Option<Vec<String>>,
    pub protected_subnet_tags: Option<Vec<Tags>>,
}

impl ResolvedNetwork {
    pub fn cidrs(&self, tier: SubnetTier) -> Option<&[String]> {
        match tier {
            SubnetTier::Public => Some(&self.public_subnet_cidrs),
            SubnetTier::Private => self.private_subnet_cidrs.as_deref(),
            SubnetTier::Protected => self.protected_subnet_cidrs.as_deref(),
        }
    }

    pub fn tags(&self, tier: SubnetTier) -> Option<&[Tags]> {
        match tier {
            SubnetTier::Public => Some(&self.public_subnet_tags),
            SubnetTier::Private => self.private_subnet_tags.as_deref(),
            SubnetTier::Protected => self.protected_subnet_tags.as_deref(),
        }
    }

    pub fn stack_name(&self) -> String {
        format!("{}-{}", self.project, self.stack)
    }
}

/// Resolve zones, CIDRs and tags for every tier.
///
/// The provider is only queried when no explicit zone list is configured.
pub fn resolve_network(
    cfg: &NetworkConfig,
    provider: &dyn ZoneProvider,
) -> Result<ResolvedNetwork, Box<dyn Error>> {
    let explicit_zones = cfg.availability_zones.as_deref().filter(|z| !z.is_empty());
    let provider_zones = match explicit_zones {
        Some(_) => Vec::new(),
        None => provider.availability_zones(&cfg.region)?,
    };
    let zones = resolve_zones(
        explicit_zones,
        cfg.number_of_availability_zones,
        &provider_zones,
    );
    if let (Some(n), None) = (cfg.number_of_availability_zones, explicit_zones) {
        if n > provider_zones.len() {
            log::warn!(
                "numberOfAvailabilityZones={n} but {} only has {} zones",
                cfg.region,
                provider_zones.len()
            );
        }
    }
    if zones.len() > DEFAULT_PUBLIC_SUBNET_CIDRS.len() {
        log::warn!(
            "{} zones selected; default CIDR tables only cover {}",
            zones.len(),
            DEFAULT_PUBLIC_SUBNET_CIDRS.len()
        );
    }

    let flags = TierFlags::from(cfg);
    let resolved = ResolvedNetwork {
        project: cfg.project.clone(),
        stack: cfg.stack.clone(),
        region: cfg.region.clone(),
        vpc_cidr: cfg.vpc_cidr.clone(),
        vpc_tenancy: cfg.vpc_tenancy.clone(),
        flags,
        public_subnet_cidrs: resolve_tier_cidrs(
            SubnetTier::Public,
            flags,
            cfg.public_subnet_cidrs.as_deref(),
            &zones,
        )
        .unwrap_or_default(),
        public_subnet_tags: resolve_tier_tags(
            SubnetTier::Public,
            flags,
            cfg.public_subnet_tags.as_deref(),
            &zones,
        )
        .unwrap_or_default(),
        private_subnet_cidrs: resolve_tier_cidrs(
            SubnetTier::Private,
            flags,
            cfg.private_subnet_cidrs.as_deref(),
            &zones,
        ),
        private_subnet_tags: resolve_tier_tags(
            SubnetTier::Private,
            flags,
            cfg.private_subnet_tags.as_deref(),
            &zones,
        ),
        protected_subnet_cidrs: resolve_tier_cidrs(
            SubnetTier::Protected,
            flags,
            cfg.protected_subnet_cidrs.as_deref(),
            &zones,
        ),
        protected_subnet_tags: resolve_tier_tags(
            SubnetTier::Protected,
            flags,
            cfg.protected_subnet_tags.as_deref(),
            &zones,
        ),
        zones,
    };

    log::info!(
        "Resolved {} zones [{}] in {} (private={}, protected={})",
        resolved.zones.len(),
        resolved.zones.join(","),
        resolved.region,
        resolved.private_subnet_cidrs.is_some(),
        resolved.protected_subnet_cidrs.is_some()
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::StaticZones;

    const ALL_ON: TierFlags = TierFlags {
        create_private_subnets: true,
        create_protected_subnets: true,
    };

    fn zones(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("us-east-1{}", (b'a' + i as u8) as char)).collect()
    }

    struct FailingZones;

    impl ZoneProvider for FailingZones {
        fn availability_zones(&self, _region: &str) -> Result<Vec<String>, Box<dyn Error>> {
            Err("provider must not be queried".into())
        }
    }

    #[test]
    fn test_resolve_zones_explicit_wins() {
        let explicit = vec!["us-east-1a".to_string(), "us-east-1b".to_string()];
        let provider = zones(6);
        assert_eq!(
            resolve_zones(Some(&explicit), Some(4), &provider),
            explicit,
            "explicit list must ignore count and provider"
        );
    }

    #[test]
    fn test_resolve_zones_count_and_fallbacks() {
        let provider = zones(3);
        assert_eq!(resolve_zones(None, Some(2), &provider), zones(2));
        assert_eq!(resolve_zones(None, Some(9), &provider), zones(3));
        assert_eq!(resolve_zones(None, None, &provider), zones(3));
        assert_eq!(resolve_zones(None, Some(0), &provider), zones(3));
        assert_eq!(resolve_zones(Some(&[]), Some(1), &provider), zones(1));
    }

    #[test]
    fn test_default_lengths_match_zone_count_up_to_four() {
        for n in 1..=4 {
            let z = zones(n);
            for tier in SubnetTier::ALL {
                let cidrs = resolve_tier_cidrs(tier, ALL_ON, None, &z).unwrap();
                let t = resolve_tier_tags(tier, ALL_ON, None, &z).unwrap();
                assert_eq!(cidrs.len(), n, "{tier} cidrs for {n} zones");
                assert_eq!(t.len(), n, "{tier} tags for {n} zones");
            }
        }
    }

    #[test]
    fn test_defaults_beyond_four_zones() {
        let z = zones(6);
        for tier in SubnetTier::ALL {
            assert_eq!(resolve_tier_cidrs(tier, ALL_ON, None, &z).unwrap().len(), 4);
            assert_eq!(resolve_tier_tags(tier, ALL_ON, None, &z).unwrap().len(), 6);
        }
    }

    #[test]
    fn test_default_values() {
        let z = zones(2);
        assert_eq!(
            resolve_tier_cidrs(SubnetTier::Protected, ALL_ON, None, &z).unwrap(),
            vec!["10.0.192.0/21", "10.0.200.0/21"]
        );
        assert_eq!(
            resolve_tier_tags(SubnetTier::Protected, ALL_ON, None, &z).unwrap()[1],
            tags([("Network", "Private")])
        );
        assert_eq!(
            resolve_tier_tags(SubnetTier::Public, ALL_ON, None, &z).unwrap()[0],
            tags([("Network", "Public")])
        );
    }

    #[test]
    fn test_protected_requires_private() {
        let flags = TierFlags {
            create_private_subnets: false,
            create_protected_subnets: true,
        };
        let z = zones(2);
        let explicit = vec!["10.0.1.0/24".to_string()];
        assert_eq!(resolve_tier_cidrs(SubnetTier::Protected, flags, Some(&explicit), &z), None);
        assert_eq!(resolve_tier_tags(SubnetTier::Protected, flags, None, &z), None);
        assert_eq!(resolve_tier_cidrs(SubnetTier::Private, flags, None, &z), None);
        assert!(resolve_tier_cidrs(SubnetTier::Public, flags, None, &z).is_some());
    }

    #[test]
    fn test_explicit_override_not_length_checked() {
        let z = zones(3);
        let explicit = vec!["10.0.1.0/24".to_string()];
        assert_eq!(
            resolve_tier_cidrs(SubnetTier::Private, ALL_ON, Some(&explicit), &z).unwrap(),
            explicit
        );
    }

    #[test]
    fn test_resolve_network_skips_provider_for_explicit_zones() {
        let cfg = NetworkConfig {
            availability_zones: Some(vec!["us-east-1a".into(), "us-east-1b".into()]),
            number_of_availability_zones: Some(3),
            ..Default::default()
        };
        let net = resolve_network(&cfg, &FailingZones).unwrap();
        assert_eq!(net.zones, vec!["us-east-1a", "us-east-1b"]);
        assert_eq!(net.public_subnet_cidrs.len(), 2);
        assert_eq!(net.private_subnet_cidrs.as_ref().map(Vec::len), Some(2));
        assert_eq!(net.protected_subnet_cidrs, None);
    }

    #[test]
    fn test_resolve_network_uses_provider() {
        let cfg = NetworkConfig {
            number_of_availability_zones: Some(3),
            create_protected_subnets: true,
            ..Default::default()
        };
        let net = resolve_network(&cfg, &StaticZones(zones(5))).unwrap();
        assert_eq!(net.zones, zones(3));
        assert_eq!(net.cidrs(SubnetTier::Protected).map(|c| c.len()), Some(3));
        assert_eq!(net.tags(SubnetTier::Private).map(|t| t.len()), Some(3));
    }

    #[test]
    fn test_resolve_network_provider_error_propagates() {
        let cfg = NetworkConfig::default();
        assert!(resolve_network(&cfg, &FailingZones).is_err());
    }
}
