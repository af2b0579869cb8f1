//! Declared resources, read from a YAML manifest.
//!
//! ```yaml
//! resources:
//!   - name: main-vpc
//!     spec:
//!       kind: vpc
//!       name: tf-test-vpc
//!       ipv4_cidr_block: 10.0.0.0/16
//!   - name: private
//!     spec:
//!       kind: subnet
//!       vpc_no: ${main-vpc}
//!       ...
//! ```
//!
//! A string field that is exactly `${name}` is replaced by the handle of the
//! earlier resource `name` before the spec is reconciled.
//!
//! Read-only lookups go under `data`; their `${name}` references resolve to
//! handles recorded in the state file:
//!
//! ```yaml
//! data:
//!   - name: ssh-rule
//!     query:
//!       kind: port_forwarding_rule
//!       server_instance_no: ${vm}
//!       internal_port: 22
//! ```

use crate::error::ControllerError;
use crate::lookup::{NksClusterQuery, PortForwardingRuleQuery, ServerQuery};
use crate::reconciler::{NatGatewaySpec, NksClusterSpec, ServerSpec, SubnetSpec, VpcSpec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Spec of one declared resource, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    Server(ServerSpec),
    Vpc(VpcSpec),
    Subnet(SubnetSpec),
    NatGateway(NatGatewaySpec),
    NksCluster(NksClusterSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::Server(_) => "server",
            ResourceSpec::Vpc(_) => "vpc",
            ResourceSpec::Subnet(_) => "subnet",
            ResourceSpec::NatGateway(_) => "nat_gateway",
            ResourceSpec::NksCluster(_) => "nks_cluster",
        }
    }

    /// Replace `${name}` strings using `resolve`
    pub fn resolve_references<F>(&self, owner: &str, resolve: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        resolve_in(self, owner, &resolve)
    }
}

/// Query of one declared lookup, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupQuery {
    Server(ServerQuery),
    PortForwardingRule(PortForwardingRuleQuery),
    NksCluster(NksClusterQuery),
    /// Node-pool names of the cluster `uuid`
    NksNodePools(NksClusterQuery),
}

impl LookupQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            LookupQuery::Server(_) => "server",
            LookupQuery::PortForwardingRule(_) => "port_forwarding_rule",
            LookupQuery::NksCluster(_) => "nks_cluster",
            LookupQuery::NksNodePools(_) => "nks_node_pools",
        }
    }

    pub fn resolve_references<F>(&self, owner: &str, resolve: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        resolve_in(self, owner, &resolve)
    }
}

fn resolve_in<T, F>(item: &T, owner: &str, resolve: &F) -> Result<T, ControllerError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&str) -> Option<String>,
{
    let mut value = serde_json::to_value(item)?;
    substitute(&mut value, owner, resolve)?;
    Ok(serde_json::from_value(value)?)
}

fn reference_name(s: &str) -> Option<&str> {
    s.strip_prefix("${")?.strip_suffix('}')
}

fn substitute<F>(value: &mut Value, owner: &str, resolve: &F) -> Result<(), ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if let Some(name) = reference_name(s) {
                let handle = resolve(name).ok_or_else(|| ControllerError::UnresolvedReference {
                    resource: owner.to_string(),
                    reference: name.to_string(),
                })?;
                *s = handle;
            }
        }
        Value::Array(items) => {
            for item in items {
                substitute(item, owner, resolve)?;
            }
        }
        Value::Object(fields) => {
            for field in fields.values_mut() {
                substitute(field, owner, resolve)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredResource {
    /// Local name, unique within the manifest
    pub name: String,
    pub spec: ResourceSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredLookup {
    /// Local name, unique within the manifest
    pub name: String,
    pub query: LookupQuery,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<DeclaredResource>,
    #[serde(default)]
    pub data: Vec<DeclaredLookup>,
}

impl Manifest {
    pub fn parse(yaml: &str) -> Result<Self, ControllerError> {
        let manifest: Manifest = serde_yaml::from_str(yaml)?;
        manifest.check()?;
        Ok(manifest)
    }

    pub async fn load(path: &Path) -> Result<Self, ControllerError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ControllerError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(&yaml)
    }

    fn check(&self) -> Result<(), ControllerError> {
        let mut seen = HashSet::new();
        let names = self
            .resources
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.data.iter().map(|d| d.name.as_str()));
        for name in names {
            if name.trim().is_empty() {
                return Err(ControllerError::InvalidManifest(
                    "every resource and lookup needs a name".to_string(),
                ));
            }
            if !seen.insert(name) {
                return Err(ControllerError::InvalidManifest(format!(
                    "{:?} is declared twice",
                    name
                )));
            }
        }
        Ok(())
    }
}
