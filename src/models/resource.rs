//! Declared cloud resources and references between them.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Resource kinds this crate declares, named by their provider type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Vpc,
    VpcDhcpOptions,
    VpcDhcpOptionsAssociation,
    InternetGateway,
    RouteTable,
    Route,
    RouteTableAssociation,
    Subnet,
    Eip,
    NatGateway,
    NetworkAcl,
    NetworkAclRule,
    VpcEndpoint,
}

impl ResourceKind {
    /// Provider type token understood by the engine.
    pub fn type_token(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "aws:ec2/vpc:Vpc",
            ResourceKind::VpcDhcpOptions => "aws:ec2/vpcDhcpOptions:VpcDhcpOptions",
            ResourceKind::VpcDhcpOptionsAssociation => {
                "aws:ec2/vpcDhcpOptionsAssociation:VpcDhcpOptionsAssociation"
            }
            ResourceKind::InternetGateway => "aws:ec2/internetGateway:InternetGateway",
            ResourceKind::RouteTable => "aws:ec2/routeTable:RouteTable",
            ResourceKind::Route => "aws:ec2/route:Route",
            ResourceKind::RouteTableAssociation => {
                "aws:ec2/routeTableAssociation:RouteTableAssociation"
            }
            ResourceKind::Subnet => "aws:ec2/subnet:Subnet",
            ResourceKind::Eip => "aws:ec2/eip:Eip",
            ResourceKind::NatGateway => "aws:ec2/natGateway:NatGateway",
            ResourceKind::NetworkAcl => "aws:ec2/networkAcl:NetworkAcl",
            ResourceKind::NetworkAclRule => "aws:ec2/networkAclRule:NetworkAclRule",
            ResourceKind::VpcEndpoint => "aws:ec2/vpcEndpoint:VpcEndpoint",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_token())
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_token())
    }
}

/// A computed attribute of a previously declared resource.
///
/// The engine substitutes the real value at apply time. Serialised as
/// `${Resource.attribute}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRef {
    pub resource: String,
    pub attribute: String,
}

impl OutputRef {
    pub fn new(resource: &str, attribute: &str) -> OutputRef {
        OutputRef {
            resource: resource.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.resource, self.attribute)
    }
}

impl Serialize for OutputRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&OutputRef> for Value {
    fn from(r: &OutputRef) -> Value {
        Value::String(r.to_string())
    }
}

/// One resource declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Logical name, unique within a graph.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub properties: Map<String, Value>,
    /// Resources that must exist before this one.
    #[serde(rename = "dependsOn", skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Resource {
        Resource {
            name: name.into(),
            kind,
            properties: Map::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Set a literal property.
    pub fn prop(mut self, key: &str, value: impl Into<Value>) -> Resource {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Set a property to another resource's output; records the dependency.
    pub fn prop_ref(mut self, key: &str, output: &OutputRef) -> Resource {
        self.depends_on.insert(output.resource.clone());
        self.properties.insert(key.to_string(), output.into());
        self
    }

    /// Set a list property of outputs; records every dependency.
    pub fn prop_refs(mut self, key: &str, outputs: &[OutputRef]) -> Resource {
        let values = outputs
            .iter()
            .map(|o| {
                self.depends_on.insert(o.resource.clone());
                Value::from(o)
            })
            .collect();
        self.properties.insert(key.to_string(), Value::Array(values));
        self
    }

    /// Explicit ordering edge with no data flow.
    pub fn depends_on(mut self, resource: &str) -> Resource {
        self.depends_on.insert(resource.to_string());
        self
    }

    /// Reference to one of this resource's computed attributes.
    pub fn output(&self, attribute: &str) -> OutputRef {
        OutputRef::new(&self.name, attribute)
    }

    pub fn id(&self) -> OutputRef {
        self.output("id")
    }
}
