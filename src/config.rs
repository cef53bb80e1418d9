//! Stack configuration.
//!
//! A stack file is a JSON document holding the project and stack names plus a
//! flat map of namespaced keys (`<project>:<key>`, `aws:region`). Values may
//! be native JSON or, as written by most IaC CLIs, strings holding JSON.

use crate::models::Tags;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::path::Path;

pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_VPC_TENANCY: &str = "default";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variables consulted for the region when `aws:region` is unset.
const REGION_ENV_VARS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

#[derive(Deserialize, Debug)]
struct StackDocument {
    project: String,
    stack: String,
    #[serde(default)]
    config: Map<String, Value>,
}

/// Typed, namespaced key-value configuration store.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    pub project: String,
    pub stack: String,
    values: Map<String, Value>,
}

/// Read a stack configuration file.
pub fn read_stack_config(path: &str) -> Result<ConfigStore, Box<dyn Error>> {
    if !Path::new(path).exists() {
        return Err(format!("Stack config file does not exist: {path}").into());
    }
    log::info!("Reading stack config: {path}");
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading stack config {path}: {e}"))?;
    ConfigStore::from_json(&json).map_err(|e| format!("{path}: {e}").into())
}

impl ConfigStore {
    pub fn new(project: &str, stack: &str, values: Map<String, Value>) -> ConfigStore {
        ConfigStore {
            project: project.to_string(),
            stack: stack.to_string(),
            values,
        }
    }

    /// Parse a stack document.
    pub fn from_json(json: &str) -> Result<ConfigStore, Box<dyn Error>> {
        let mut de = serde_json::Deserializer::from_str(json);
        let doc: StackDocument = serde_path_to_error::deserialize(&mut de)
            .map_err(|e| format!("Error parsing stack config: path={} error={}", e.path(), e))?;
        log::debug!(
            "stack config {}/{} has {} keys",
            doc.project,
            doc.stack,
            doc.config.len()
        );
        Ok(ConfigStore {
            project: doc.project,
            stack: doc.stack,
            values: doc.config,
        })
    }

    /// Fully qualified key: bare keys live in the project namespace.
    fn full_key(&self, key: &str) -> String {
        if key.contains(':') {
            key.to_string()
        } else {
            format!("{}:{}", self.project, key)
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        match self.values.get(&self.full_key(key)) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    /// Read a string value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Read a boolean, accepting `true` or any of the string forms of [`parse_bool`].
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, Box<dyn Error>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => parse_bool(s)
                .map(Some)
                .ok_or_else(|| self.type_error(key, "a boolean", s)),
            Some(other) => Err(self.type_error(key, "a boolean", &other.to_string())),
        }
    }

    /// Read an integer, accepting `3` or `"3"`.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>, Box<dyn Error>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.type_error(key, "an integer", &n.to_string())),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| self.type_error(key, "an integer", s)),
            Some(other) => Err(self.type_error(key, "an integer", &other.to_string())),
        }
    }

    /// Read a structured value; a string value is parsed as JSON first.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Box<dyn Error>> {
        let value = match self.lookup(key) {
            None => return Ok(None),
            Some(v) => v,
        };
        let parsed = match value {
            Value::String(s) => {
                let mut de = serde_json::Deserializer::from_str(s);
                serde_path_to_error::deserialize(&mut de).map_err(|e| self.path_error(key, e))?
            }
            other => serde_path_to_error::deserialize(other).map_err(|e| self.path_error(key, e))?,
        };
        Ok(Some(parsed))
    }

    fn path_error<E: std::fmt::Display>(
        &self,
        key: &str,
        e: serde_path_to_error::Error<E>,
    ) -> Box<dyn Error> {
        format!(
            "config key '{}': path={} error={}",
            self.full_key(key),
            e.path(),
            e
        )
        .into()
    }

    fn type_error(&self, key: &str, expected: &str, got: &str) -> Box<dyn Error> {
        format!(
            "config key '{}': expected {expected}, got {got}",
            self.full_key(key)
        )
        .into()
    }
}

/// Parse the boolean spellings IaC CLIs write: `true`, `True`, `TRUE`, `t`, `1`
/// and their false counterparts.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" | "t" | "T" | "1" => Some(true),
        "false" | "False" | "FALSE" | "f" | "F" | "0" => Some(false),
        _ => None,
    }
}

/// Network settings read once from the store and passed by reference to the
/// resolver and builder.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub project: String,
    pub stack: String,
    pub region: String,
    /// Exact zones to use, in order.
    pub availability_zones: Option<Vec<String>>,
    /// Take the first N zones of the region.
    pub number_of_availability_zones: Option<usize>,
    /// false creates only public subnets.
    pub create_private_subnets: bool,
    /// NACL protected subnets; only honored together with `create_private_subnets`.
    pub create_protected_subnets: bool,
    pub vpc_cidr: String,
    pub vpc_tenancy: String,
    pub public_subnet_cidrs: Option<Vec<String>>,
    pub public_subnet_tags: Option<Vec<Tags>>,
    pub private_subnet_cidrs: Option<Vec<String>>,
    pub private_subnet_tags: Option<Vec<Tags>>,
    pub protected_subnet_cidrs: Option<Vec<String>>,
    pub protected_subnet_tags: Option<Vec<Tags>>,
}

impl NetworkConfig {
    /// Read every network setting, applying the scalar defaults.
    ///
    /// The region comes from `aws:region`, then the process environment.
    pub fn from_store(store: &ConfigStore) -> Result<NetworkConfig, Box<dyn Error>> {
        NetworkConfig::from_store_with_env(store, |var| std::env::var(var).ok())
    }

    /// [`NetworkConfig::from_store`] with an explicit environment lookup.
    pub fn from_store_with_env<F>(
        store: &ConfigStore,
        env: F,
    ) -> Result<NetworkConfig, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number_of_availability_zones = match store.get_int("numberOfAvailabilityZones")? {
            Some(n) if n < 0 => {
                return Err(format!("numberOfAvailabilityZones must not be negative: {n}").into())
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        let cfg = NetworkConfig {
            project: store.project.clone(),
            stack: store.stack.clone(),
            region: store
                .get("aws:region")
                .unwrap_or_else(|| default_region_from(env)),
            availability_zones: store.get_object("availabilityZones")?,
            number_of_availability_zones,
            create_private_subnets: store.get_bool("createPrivateSubnets")?.unwrap_or(true),
            create_protected_subnets: store.get_bool("createProtectedSubnets")?.unwrap_or(false),
            vpc_cidr: store
                .get("vpcCidr")
                .unwrap_or_else(|| DEFAULT_VPC_CIDR.to_string()),
            vpc_tenancy: store
                .get("vpcTenancy")
                .unwrap_or_else(|| DEFAULT_VPC_TENANCY.to_string()),
            public_subnet_cidrs: store.get_object("publicSubnetCidrs")?,
            public_subnet_tags: store.get_object("publicSubnetTags")?,
            private_subnet_cidrs: store.get_object("privateSubnetCidrs")?,
            private_subnet_tags: store.get_object("privateSubnetTags")?,
            protected_subnet_cidrs: store.get_object("protectedSubnetCidrs")?,
            protected_subnet_tags: store.get_object("protectedSubnetTags")?,
        };

        if cfg.create_protected_subnets && !cfg.create_private_subnets {
            log::warn!(
                "createProtectedSubnets requires createPrivateSubnets; no protected subnets will be declared"
            );
        }
        log::debug!("network config: {cfg:?}");
        Ok(cfg)
    }

    /// Name tag shared by the VPC and internet gateway.
    pub fn stack_name(&self) -> String {
        format!("{}-{}", self.project, self.stack)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            project: "base-infra".to_string(),
            stack: "dev".to_string(),
            region: DEFAULT_REGION.to_string(),
            availability_zones: None,
            number_of_availability_zones: None,
            create_private_subnets: true,
            create_protected_subnets: false,
            vpc_cidr: DEFAULT_VPC_CIDR.to_string(),
            vpc_tenancy: DEFAULT_VPC_TENANCY.to_string(),
            public_subnet_cidrs: None,
            public_subnet_tags: None,
            private_subnet_cidrs: None,
            private_subnet_tags: None,
            protected_subnet_cidrs: None,
            protected_subnet_tags: None,
        }
    }
}

/// First non-empty region variable, else [`DEFAULT_REGION`].
fn default_region_from<F>(env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    REGION_ENV_VARS
        .iter()
        .find_map(|var| env(var).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}
