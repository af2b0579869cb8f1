//! NCloud API models
//!
//! These models follow the JSON shapes of the Server, VPC and NKS APIs
//! (`responseFormatType=json`). Unknown fields are ignored and missing ones
//! default, since the vendor omits attributes that are not yet assigned.

use crate::common::QueryParams;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment topology; selects the API family used for servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    Classic,
    Vpc,
}

impl DeploymentMode {
    /// Map the provider's `support_vpc` capability flag to a mode
    pub fn from_support_vpc(support_vpc: bool) -> Self {
        if support_vpc {
            DeploymentMode::Vpc
        } else {
            DeploymentMode::Classic
        }
    }

    /// Service path of the server API family for this mode
    pub fn server_service(self) -> &'static str {
        match self {
            DeploymentMode::Classic => "server",
            DeploymentMode::Vpc => "vserver",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Classic => f.write_str("classic"),
            DeploymentMode::Vpc => f.write_str("vpc"),
        }
    }
}

/// Code/name pair used by the vendor for statuses and types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonCode {
    pub code: String,
    pub code_name: Option<String>,
}

impl CommonCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            code_name: None,
        }
    }
}

fn code_of(code: &Option<CommonCode>) -> &str {
    code.as_ref().map(|c| c.code.as_str()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Server instance (classic `server` and VPC `vserver` APIs)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInstance {
    pub server_instance_no: String,
    pub server_name: String,
    pub server_description: Option<String>,
    pub server_image_product_code: Option<String>,
    pub server_product_code: Option<String>,
    pub server_instance_status: Option<CommonCode>,
    pub server_instance_status_name: Option<String>,
    pub server_instance_operation: Option<CommonCode>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub zone_code: Option<String>,
    pub vpc_no: Option<String>,
    pub subnet_no: Option<String>,
    pub login_key_name: Option<String>,
    pub create_date: Option<String>,
}

impl ServerInstance {
    /// Status code (`INIT`, `CREAT`, `RUN`, `NSTOP`, ...)
    pub fn status_code(&self) -> &str {
        code_of(&self.server_instance_status)
    }
}

/// Arguments of `createServerInstances`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub server_name: String,
    pub server_description: Option<String>,
    pub server_image_product_code: String,
    pub server_product_code: Option<String>,
    pub login_key_name: Option<String>,
    /// Classic placement
    pub zone_no: Option<String>,
    /// VPC placement
    pub vpc_no: Option<String>,
    pub subnet_no: Option<String>,
    /// Access control groups (classic configuration numbers, VPC ACG numbers)
    pub access_control_group_nos: Vec<String>,
}

impl CreateServerRequest {
    pub fn to_params(&self, mode: DeploymentMode) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("serverName", self.server_name.as_str())
            .push_opt("serverDescription", self.server_description.as_deref())
            .push("serverImageProductCode", self.server_image_product_code.as_str())
            .push_opt("serverProductCode", self.server_product_code.as_deref())
            .push_opt("loginKeyName", self.login_key_name.as_deref());

        match mode {
            DeploymentMode::Classic => {
                params
                    .push_opt("zoneNo", self.zone_no.as_deref())
                    .push_list(
                        "accessControlGroupConfigurationNoList",
                        &self.access_control_group_nos,
                    );
            }
            DeploymentMode::Vpc => {
                params
                    .push_opt("vpcNo", self.vpc_no.as_deref())
                    .push_opt("subnetNo", self.subnet_no.as_deref())
                    .push("networkInterfaceList.1.networkInterfaceOrder", "0")
                    .push_list(
                        "networkInterfaceList.1.accessControlGroupNoList",
                        &self.access_control_group_nos,
                    );
            }
        }
        params
    }
}

/// Filter of `getServerInstanceList`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerListFilter {
    pub server_instance_nos: Vec<String>,
    pub server_name: Option<String>,
    pub vpc_no: Option<String>,
}

impl ServerListFilter {
    /// Filter selecting one instance by number
    pub fn by_instance_no(no: impl Into<String>) -> Self {
        Self {
            server_instance_nos: vec![no.into()],
            ..Self::default()
        }
    }

    pub fn to_params(&self, mode: DeploymentMode) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push_list("serverInstanceNoList", &self.server_instance_nos)
            .push_opt("serverName", self.server_name.as_deref());
        if mode == DeploymentMode::Vpc {
            params.push_opt("vpcNo", self.vpc_no.as_deref());
        }
        params
    }
}

/// Response body of every server action returning instances
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInstanceList {
    pub total_rows: Option<u32>,
    pub server_instance_list: Vec<ServerInstance>,
}

// ---------------------------------------------------------------------------
// Port forwarding (classic)
// ---------------------------------------------------------------------------

/// Server side of a port-forwarding rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortForwardingServer {
    pub server_instance_no: String,
    pub server_name: Option<String>,
    pub port_forwarding_public_ip: Option<String>,
}

/// One port-forwarding rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortForwardingRule {
    pub port_forwarding_external_port: i32,
    pub port_forwarding_internal_port: i32,
    pub server_instance: Option<PortForwardingServer>,
}

/// Response body of `getPortForwardingRuleList`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortForwardingRuleList {
    pub port_forwarding_configuration_no: Option<String>,
    pub port_forwarding_public_ip: Option<String>,
    pub total_rows: Option<u32>,
    pub port_forwarding_rule_list: Vec<PortForwardingRule>,
}

/// Filter of `getPortForwardingRuleList`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortForwardingRuleFilter {
    pub region_no: Option<String>,
    pub zone_no: Option<String>,
}

impl PortForwardingRuleFilter {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push_opt("regionNo", self.region_no.as_deref())
            .push_opt("zoneNo", self.zone_no.as_deref());
        params
    }
}

// ---------------------------------------------------------------------------
// VPC
// ---------------------------------------------------------------------------

/// VPC network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vpc {
    pub vpc_no: String,
    pub vpc_name: String,
    pub ipv4_cidr_block: String,
    pub vpc_status: Option<CommonCode>,
    pub region_code: Option<String>,
    pub create_date: Option<String>,
}

impl Vpc {
    pub fn status_code(&self) -> &str {
        code_of(&self.vpc_status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVpcRequest {
    pub vpc_name: String,
    pub ipv4_cidr_block: String,
}

impl CreateVpcRequest {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("vpcName", self.vpc_name.as_str())
            .push("ipv4CidrBlock", self.ipv4_cidr_block.as_str());
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpcListFilter {
    pub vpc_nos: Vec<String>,
    pub vpc_name: Option<String>,
}

impl VpcListFilter {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push_list("vpcNoList", &self.vpc_nos)
            .push_opt("vpcName", self.vpc_name.as_deref());
        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcList {
    pub total_rows: Option<u32>,
    pub vpc_list: Vec<Vpc>,
}

// ---------------------------------------------------------------------------
// Subnet
// ---------------------------------------------------------------------------

/// Subnet of a VPC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnet {
    pub subnet_no: String,
    pub vpc_no: String,
    pub zone_code: String,
    pub subnet_name: String,
    pub subnet: String,
    pub subnet_status: Option<CommonCode>,
    pub subnet_type: Option<CommonCode>,
    pub usage_type: Option<CommonCode>,
    pub network_acl_no: Option<String>,
}

impl Subnet {
    pub fn status_code(&self) -> &str {
        code_of(&self.subnet_status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSubnetRequest {
    pub vpc_no: String,
    pub zone_code: String,
    pub subnet_name: String,
    pub subnet: String,
    pub network_acl_no: String,
    pub subnet_type_code: String,
    pub usage_type_code: Option<String>,
}

impl CreateSubnetRequest {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("vpcNo", self.vpc_no.as_str())
            .push("zoneCode", self.zone_code.as_str())
            .push("subnetName", self.subnet_name.as_str())
            .push("subnet", self.subnet.as_str())
            .push("networkAclNo", self.network_acl_no.as_str())
            .push("subnetTypeCode", self.subnet_type_code.as_str())
            .push_opt("usageTypeCode", self.usage_type_code.as_deref());
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetListFilter {
    pub subnet_nos: Vec<String>,
    pub vpc_no: Option<String>,
    pub subnet_name: Option<String>,
}

impl SubnetListFilter {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push_list("subnetNoList", &self.subnet_nos)
            .push_opt("vpcNo", self.vpc_no.as_deref())
            .push_opt("subnetName", self.subnet_name.as_deref());
        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubnetList {
    pub total_rows: Option<u32>,
    pub subnet_list: Vec<Subnet>,
}

// ---------------------------------------------------------------------------
// NAT gateway
// ---------------------------------------------------------------------------

/// NAT gateway instance of a VPC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NatGatewayInstance {
    pub nat_gateway_instance_no: String,
    pub nat_gateway_name: String,
    pub nat_gateway_description: Option<String>,
    pub public_ip: Option<String>,
    pub vpc_no: String,
    pub zone_code: String,
    pub nat_gateway_instance_status: Option<CommonCode>,
    pub nat_gateway_instance_status_name: Option<String>,
}

impl NatGatewayInstance {
    pub fn status_code(&self) -> &str {
        code_of(&self.nat_gateway_instance_status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNatGatewayRequest {
    pub vpc_no: String,
    pub zone_code: String,
    pub nat_gateway_name: Option<String>,
    pub nat_gateway_description: Option<String>,
}

impl CreateNatGatewayRequest {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("vpcNo", self.vpc_no.as_str())
            .push("zoneCode", self.zone_code.as_str())
            .push_opt("natGatewayName", self.nat_gateway_name.as_deref())
            .push_opt("natGatewayDescription", self.nat_gateway_description.as_deref());
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NatGatewayListFilter {
    pub nat_gateway_instance_nos: Vec<String>,
    pub vpc_no: Option<String>,
}

impl NatGatewayListFilter {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push_list("natGatewayInstanceNoList", &self.nat_gateway_instance_nos)
            .push_opt("vpcNo", self.vpc_no.as_deref());
        params
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NatGatewayInstanceList {
    pub total_rows: Option<u32>,
    pub nat_gateway_instance_list: Vec<NatGatewayInstance>,
}

// ---------------------------------------------------------------------------
// Kubernetes service (NKS)
// ---------------------------------------------------------------------------

/// Managed Kubernetes cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NksCluster {
    pub uuid: String,
    pub name: String,
    pub cluster_type: String,
    /// Kubernetes API endpoint, assigned once provisioning completes
    pub endpoint: Option<String>,
    pub login_key_name: String,
    pub k8s_version: Option<String>,
    pub zone_code: String,
    pub vpc_no: u64,
    pub subnet_no_list: Vec<u64>,
    pub lb_private_subnet_no: Option<u64>,
    pub lb_public_subnet_no: Option<u64>,
    pub kube_network_plugin: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
}

/// Request body of `POST /vnks/v2/clusters`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNksClusterRequest {
    pub name: String,
    pub cluster_type: String,
    pub login_key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k8s_version: Option<String>,
    pub zone_code: String,
    pub vpc_no: u64,
    pub subnet_no_list: Vec<u64>,
    pub lb_private_subnet_no: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lb_public_subnet_no: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_network_plugin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NksClusterEnvelope {
    pub cluster: NksCluster,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NksClusterListEnvelope {
    pub clusters: Vec<NksCluster>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNksClusterResponse {
    pub uuid: String,
}

/// Node pool of an NKS cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePool {
    pub instance_no: u64,
    pub name: String,
    pub status: String,
    pub node_count: u32,
    pub k8s_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePoolListEnvelope {
    pub node_pool: Vec<NodePool>,
}
