//! Availability zone providers.
//!
//! The resolver only asks a provider for the region's zones when the stack
//! does not pin an explicit zone list.

use super::cli;
use serde::Deserialize;
use std::error::Error;

/// Source of the availability zones in a region, in provider order.
pub trait ZoneProvider {
    fn availability_zones(&self, region: &str) -> Result<Vec<String>, Box<dyn Error>>;
}

/// A fixed zone list, e.g. read from `--zones-file`.
#[derive(Debug, Clone, Default)]
pub struct StaticZones(pub Vec<String>);

impl StaticZones {
    pub fn new<S: AsRef<str>>(zones: &[S]) -> StaticZones {
        StaticZones(zones.iter().map(|z| z.as_ref().to_string()).collect())
    }

    /// Load a JSON array of zone names.
    pub fn from_file(path: &str) -> Result<StaticZones, Box<dyn Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading zones file {path}: {e}"))?;
        let mut de = serde_json::Deserializer::from_str(&json);
        let zones: Vec<String> = serde_path_to_error::deserialize(&mut de).map_err(|e| {
            format!(
                "Error parsing zones file {path}: path={} error={}",
                e.path(),
                e
            )
        })?;
        log::info!("Loaded {} zones from {path}", zones.len());
        Ok(StaticZones(zones))
    }
}

impl ZoneProvider for StaticZones {
    fn availability_zones(&self, _region: &str) -> Result<Vec<String>, Box<dyn Error>> {
        Ok(self.0.clone())
    }
}

/// Queries the region through `aws ec2 describe-availability-zones`.
#[derive(Debug, Clone, Default)]
pub struct AwsCliZones {
    /// Optional named CLI profile.
    pub profile: Option<String>,
}

impl AwsCliZones {
    fn command(&self, region: &str) -> String {
        let mut cmd = format!(
            "aws ec2 describe-availability-zones --region {region} --filters 'Name=zone-type,Values=availability-zone' --output json"
        );
        if let Some(profile) = &self.profile {
            cmd.push_str(&format!(" --profile {profile}"));
        }
        cmd
    }
}

impl ZoneProvider for AwsCliZones {
    fn availability_zones(&self, region: &str) -> Result<Vec<String>, Box<dyn Error>> {
        let output = cli::run(&self.command(region))?;
        let zones = parse_describe_zones(&output)?;
        log::info!(
            "aws cli returned {} available zones in {region}: {}",
            zones.len(),
            zones.join(",")
        );
        Ok(zones)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct DescribeZones {
    availability_zones: Vec<ZoneRecord>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ZoneRecord {
    zone_name: String,
    #[serde(default)]
    state: Option<String>,
}

/// Extract the names of available zones from `describe-availability-zones` JSON.
pub fn parse_describe_zones(json: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let mut de = serde_json::Deserializer::from_str(json);
    let parsed: DescribeZones = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", json);
        format!(
            "Error parsing describe-availability-zones: path={} error={}",
            e.path(),
            e
        )
    })?;

    Ok(parsed
        .availability_zones
        .into_iter()
        .filter(|z| z.state.as_deref().map_or(true, |s| s == "available"))
        .map(|z| z.zone_name)
        .collect())
}
