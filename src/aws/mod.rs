//! AWS CLI interaction for values the declarations need from the live account.
//!
//! - [`cli`] - Shell command execution
//! - [`zones`] - Availability zone providers
//! - [`cache`] - Dated on-disk cache of the zone list

mod cache;
mod cli;
mod zones;

// Re-export public types and functions
pub use cache::{read_zone_cache, CachedZones};
pub use cli::run;
pub use zones::{parse_describe_zones, AwsCliZones, StaticZones, ZoneProvider};
