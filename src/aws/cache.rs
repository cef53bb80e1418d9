//! Cache management for the region's zone list.
//!
//! Avoids a CLI round trip on every plan; one cache file per region per day.

use super::zones::ZoneProvider;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ZoneCache {
    region: String,
    fetched: String,
    zones: Vec<String>,
}

/// Default cache file name for a region, dated today (UTC).
pub fn default_cache_file(region: &str) -> String {
    let today = chrono::Utc::now().format("%Y-%m-%d");
    format!("az_cache_{region}_{today}.json")
}

/// Read the region's zones from cache, or fetch them from `provider` and write the cache.
///
/// # Arguments
/// * `region` - Region whose zones are wanted
/// * `cache_file` - Optional cache path. If None, uses [`default_cache_file`]
/// * `provider` - Queried on a cache miss
pub fn read_zone_cache(
    region: &str,
    cache_file: Option<&str>,
    provider: &dyn ZoneProvider,
) -> Result<Vec<String>, Box<dyn Error>> {
    let cache_file = cache_file
        .map(|f| f.to_string())
        .unwrap_or_else(|| default_cache_file(region));

    if Path::new(&cache_file).exists() {
        log::info!("Reading zones from cache file: {cache_file}");
        let json = std::fs::read_to_string(&cache_file)
            .map_err(|e| format!("Error reading cache file {cache_file}: {e}"))?;
        let cache: ZoneCache = serde_json::from_str(&json)
            .map_err(|e| format!("Error parsing cache JSON {cache_file}: {e}"))?;
        if cache.region == region {
            return Ok(cache.zones);
        }
        log::warn!(
            "Cache file {cache_file} holds region {} not {region}, refreshing",
            cache.region
        );
    } else {
        log::warn!("Cache file not found: {cache_file}");
    }

    let zones = provider.availability_zones(region)?;
    let cache = ZoneCache {
        region: region.to_string(),
        fetched: chrono::Utc::now().to_rfc3339(),
        zones,
    };
    let json =
        serde_json::to_string_pretty(&cache).map_err(|e| format!("Error serializing JSON: {e}"))?;
    log::warn!("Writing zones to cache file: {cache_file}");
    std::fs::write(&cache_file, json)
        .map_err(|e| format!("Error writing cache file {cache_file}: {e}"))?;
    Ok(cache.zones)
}

/// [`ZoneProvider`] that consults the on-disk cache before the inner provider.
#[derive(Debug)]
pub struct CachedZones<P> {
    pub inner: P,
    pub cache_file: Option<String>,
}

impl<P: ZoneProvider> ZoneProvider for CachedZones<P> {
    fn availability_zones(&self, region: &str) -> Result<Vec<String>, Box<dyn Error>> {
        read_zone_cache(region, self.cache_file.as_deref(), &self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::StaticZones;
    use std::cell::Cell;

    struct CountingZones {
        calls: Cell<usize>,
    }

    impl ZoneProvider for CountingZones {
        fn availability_zones(&self, region: &str) -> Result<Vec<String>, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![format!("{region}a"), format!("{region}b")])
        }
    }

    #[test]
    fn test_default_cache_file_name() {
        let name = default_cache_file("us-east-1");
        assert!(name.starts_with("az_cache_us-east-1_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        let path = path.to_str().unwrap();
        let provider = CountingZones {
            calls: Cell::new(0),
        };

        let first = read_zone_cache("eu-west-1", Some(path), &provider).unwrap();
        let second = read_zone_cache("eu-west-1", Some(path), &provider).unwrap();
        assert_eq!(first, vec!["eu-west-1a", "eu-west-1b"]);
        assert_eq!(first, second);
        assert_eq!(provider.calls.get(), 1, "second read must come from cache");
    }

    #[test]
    fn test_cache_for_other_region_is_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        let path = path.to_str().unwrap();

        read_zone_cache("eu-west-1", Some(path), &StaticZones::new(&["eu-west-1a"])).unwrap();
        let zones =
            read_zone_cache("us-east-2", Some(path), &StaticZones::new(&["us-east-2a"])).unwrap();
        assert_eq!(zones, vec!["us-east-2a"]);
    }

    #[test]
    fn test_cached_zones_provider() {
        let dir = tempfile::tempdir().unwrap();
        let cached = CachedZones {
            inner: StaticZones::new(&["ap-south-1a", "ap-south-1b"]),
            cache_file: Some(dir.path().join("c.json").to_string_lossy().to_string()),
        };
        assert_eq!(
            cached.availability_zones("ap-south-1").unwrap(),
            vec!["ap-south-1a", "ap-south-1b"]
        );
    }
}
