//! NcloudClient trait for mocking
//!
//! This trait abstracts the NcloudClient so the reconciler can be driven by a
//! mock in unit tests. The concrete NcloudClient implements it against the
//! API gateways.

use crate::error::NcloudError;
use crate::models::*;

/// Trait for NCloud API client operations
///
/// One method per vendor operation. All async methods must be `Send` to work
/// with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait NcloudClientTrait: Send + Sync {
    /// Region the client addresses (e.g. `KR`)
    fn region(&self) -> &str;

    // Server operations (classic `server` or VPC `vserver`, by mode)
    async fn create_server_instance(&self, mode: DeploymentMode, request: &CreateServerRequest) -> Result<ServerInstance, NcloudError>;
    async fn get_server_instance_list(&self, mode: DeploymentMode, filter: &ServerListFilter) -> Result<Vec<ServerInstance>, NcloudError>;
    async fn stop_server_instance(&self, mode: DeploymentMode, server_instance_no: &str) -> Result<(), NcloudError>;
    async fn start_server_instance(&self, mode: DeploymentMode, server_instance_no: &str) -> Result<(), NcloudError>;
    async fn change_server_instance_spec(&self, mode: DeploymentMode, server_instance_no: &str, server_product_code: &str) -> Result<(), NcloudError>;
    async fn terminate_server_instance(&self, mode: DeploymentMode, server_instance_no: &str) -> Result<(), NcloudError>;

    // Classic port forwarding
    async fn get_port_forwarding_rule_list(&self, filter: &PortForwardingRuleFilter) -> Result<PortForwardingRuleList, NcloudError>;

    // VPC operations
    async fn create_vpc(&self, request: &CreateVpcRequest) -> Result<Vpc, NcloudError>;
    async fn get_vpc_list(&self, filter: &VpcListFilter) -> Result<Vec<Vpc>, NcloudError>;
    async fn delete_vpc(&self, vpc_no: &str) -> Result<(), NcloudError>;
    async fn create_subnet(&self, request: &CreateSubnetRequest) -> Result<Subnet, NcloudError>;
    async fn get_subnet_list(&self, filter: &SubnetListFilter) -> Result<Vec<Subnet>, NcloudError>;
    async fn set_subnet_network_acl(&self, subnet_no: &str, network_acl_no: &str) -> Result<(), NcloudError>;
    async fn delete_subnet(&self, subnet_no: &str) -> Result<(), NcloudError>;
    async fn create_nat_gateway_instance(&self, request: &CreateNatGatewayRequest) -> Result<NatGatewayInstance, NcloudError>;
    async fn get_nat_gateway_instance_list(&self, filter: &NatGatewayListFilter) -> Result<Vec<NatGatewayInstance>, NcloudError>;
    async fn set_nat_gateway_description(&self, nat_gateway_instance_no: &str, description: &str) -> Result<(), NcloudError>;
    async fn delete_nat_gateway_instance(&self, nat_gateway_instance_no: &str) -> Result<(), NcloudError>;

    // Kubernetes service (NKS)
    async fn create_nks_cluster(&self, request: &CreateNksClusterRequest) -> Result<String, NcloudError>;
    async fn get_nks_cluster(&self, uuid: &str) -> Result<NksCluster, NcloudError>;
    async fn get_nks_clusters(&self) -> Result<Vec<NksCluster>, NcloudError>;
    async fn upgrade_nks_cluster(&self, uuid: &str, k8s_version: &str) -> Result<(), NcloudError>;
    async fn delete_nks_cluster(&self, uuid: &str) -> Result<(), NcloudError>;
    async fn get_nks_node_pools(&self, uuid: &str) -> Result<Vec<NodePool>, NcloudError>;
}
