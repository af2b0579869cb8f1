//! NCloud API client
//!
//! Implements the vendor operations used by the reconciler:
//! - Server API (`/server/v2/` classic, `/vserver/v2/` VPC)
//! - VPC API (`/vpc/v2/`)
//! - Kubernetes service REST API (`/vnks/v2/clusters`)

use crate::common::{Credentials, Endpoints, HttpClient, QueryParams};
use crate::error::NcloudError;
use crate::models::*;
use crate::ncloud_trait::NcloudClientTrait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

const VPC_SERVICE: &str = "vpc";
const NKS_CLUSTERS: &str = "/vnks/v2/clusters";

/// NCloud API client
#[derive(Debug)]
pub struct NcloudClient {
    http: HttpClient,
    region: String,
}

impl NcloudClient {
    /// Create a new NCloud client
    ///
    /// # Arguments
    /// * `endpoints` - API gateway base URLs (see [`Endpoints::for_site`])
    /// * `credentials` - access/secret key pair used to sign every request
    /// * `region` - region code, e.g. "KR"
    pub fn new(
        endpoints: Endpoints,
        credentials: Credentials,
        region: impl Into<String>,
    ) -> Result<Self, NcloudError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(NcloudError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, endpoints, credentials),
            region: region.into(),
        })
    }

    /// Get the configured gateways
    pub fn endpoints(&self) -> &Endpoints {
        self.http.endpoints()
    }

    /// VPC-family actions are addressed by region code; classic ones by zone
    fn scoped(&self, mode: DeploymentMode, mut params: QueryParams) -> QueryParams {
        if mode == DeploymentMode::Vpc {
            params.push("regionCode", self.region.as_str());
        }
        params
    }

    async fn server_action(
        &self,
        mode: DeploymentMode,
        action: &str,
        params: QueryParams,
    ) -> Result<Vec<ServerInstance>, NcloudError> {
        let params = self.scoped(mode, params);
        let list: ServerInstanceList = self
            .http
            .call_action(mode.server_service(), action, &params)
            .await?;
        Ok(list.server_instance_list)
    }

    async fn vpc_action<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        params: QueryParams,
    ) -> Result<T, NcloudError> {
        let params = self.scoped(DeploymentMode::Vpc, params);
        self.http.call_action(VPC_SERVICE, action, &params).await
    }

    fn single_server_params(server_instance_no: &str) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_list("serverInstanceNoList", &[server_instance_no]);
        params
    }
}

fn first_or_missing<T>(items: Vec<T>, action: &str) -> Result<T, NcloudError> {
    items.into_iter().next().ok_or_else(|| NcloudError::Api {
        status: 200,
        code: "empty-response".to_string(),
        message: format!("{}: response contained no instance", action),
    })
}

#[async_trait::async_trait]
impl NcloudClientTrait for NcloudClient {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_server_instance(
        &self,
        mode: DeploymentMode,
        request: &CreateServerRequest,
    ) -> Result<ServerInstance, NcloudError> {
        debug!("Creating {} server {}", mode, request.server_name);
        let servers = self
            .server_action(mode, "createServerInstances", request.to_params(mode))
            .await?;
        first_or_missing(servers, "createServerInstances")
    }

    async fn get_server_instance_list(
        &self,
        mode: DeploymentMode,
        filter: &ServerListFilter,
    ) -> Result<Vec<ServerInstance>, NcloudError> {
        debug!("Querying {} servers with filter {:?}", mode, filter);
        self.server_action(mode, "getServerInstanceList", filter.to_params(mode))
            .await
    }

    async fn stop_server_instance(
        &self,
        mode: DeploymentMode,
        server_instance_no: &str,
    ) -> Result<(), NcloudError> {
        debug!("Stopping server {}", server_instance_no);
        self.server_action(
            mode,
            "stopServerInstances",
            Self::single_server_params(server_instance_no),
        )
        .await
        .map(|_| ())
    }

    async fn start_server_instance(
        &self,
        mode: DeploymentMode,
        server_instance_no: &str,
    ) -> Result<(), NcloudError> {
        debug!("Starting server {}", server_instance_no);
        self.server_action(
            mode,
            "startServerInstances",
            Self::single_server_params(server_instance_no),
        )
        .await
        .map(|_| ())
    }

    async fn change_server_instance_spec(
        &self,
        mode: DeploymentMode,
        server_instance_no: &str,
        server_product_code: &str,
    ) -> Result<(), NcloudError> {
        debug!(
            "Changing server {} product to {}",
            server_instance_no, server_product_code
        );
        let mut params = QueryParams::new();
        params
            .push("serverInstanceNo", server_instance_no)
            .push("serverProductCode", server_product_code);
        self.server_action(mode, "changeServerInstanceSpec", params)
            .await
            .map(|_| ())
    }

    async fn terminate_server_instance(
        &self,
        mode: DeploymentMode,
        server_instance_no: &str,
    ) -> Result<(), NcloudError> {
        debug!("Terminating server {}", server_instance_no);
        self.server_action(
            mode,
            "terminateServerInstances",
            Self::single_server_params(server_instance_no),
        )
        .await
        .map(|_| ())
    }

    async fn get_port_forwarding_rule_list(
        &self,
        filter: &PortForwardingRuleFilter,
    ) -> Result<PortForwardingRuleList, NcloudError> {
        debug!("Querying port forwarding rules with filter {:?}", filter);
        self.http
            .call_action(
                DeploymentMode::Classic.server_service(),
                "getPortForwardingRuleList",
                &filter.to_params(),
            )
            .await
    }

    async fn create_vpc(&self, request: &CreateVpcRequest) -> Result<Vpc, NcloudError> {
        debug!("Creating VPC {}", request.vpc_name);
        let list: VpcList = self.vpc_action("createVpc", request.to_params()).await?;
        first_or_missing(list.vpc_list, "createVpc")
    }

    async fn get_vpc_list(&self, filter: &VpcListFilter) -> Result<Vec<Vpc>, NcloudError> {
        let list: VpcList = self.vpc_action("getVpcList", filter.to_params()).await?;
        Ok(list.vpc_list)
    }

    async fn delete_vpc(&self, vpc_no: &str) -> Result<(), NcloudError> {
        debug!("Deleting VPC {}", vpc_no);
        let mut params = QueryParams::new();
        params.push("vpcNo", vpc_no);
        self.vpc_action::<serde_json::Value>("deleteVpc", params)
            .await
            .map(|_| ())
    }

    async fn create_subnet(&self, request: &CreateSubnetRequest) -> Result<Subnet, NcloudError> {
        debug!("Creating subnet {} in VPC {}", request.subnet_name, request.vpc_no);
        let list: SubnetList = self.vpc_action("createSubnet", request.to_params()).await?;
        first_or_missing(list.subnet_list, "createSubnet")
    }

    async fn get_subnet_list(&self, filter: &SubnetListFilter) -> Result<Vec<Subnet>, NcloudError> {
        let list: SubnetList = self.vpc_action("getSubnetList", filter.to_params()).await?;
        Ok(list.subnet_list)
    }

    async fn set_subnet_network_acl(
        &self,
        subnet_no: &str,
        network_acl_no: &str,
    ) -> Result<(), NcloudError> {
        debug!("Setting network ACL {} on subnet {}", network_acl_no, subnet_no);
        let mut params = QueryParams::new();
        params
            .push("subnetNo", subnet_no)
            .push("networkAclNo", network_acl_no);
        self.vpc_action::<serde_json::Value>("setSubnetNetworkAcl", params)
            .await
            .map(|_| ())
    }

    async fn delete_subnet(&self, subnet_no: &str) -> Result<(), NcloudError> {
        debug!("Deleting subnet {}", subnet_no);
        let mut params = QueryParams::new();
        params.push("subnetNo", subnet_no);
        self.vpc_action::<serde_json::Value>("deleteSubnet", params)
            .await
            .map(|_| ())
    }

    async fn create_nat_gateway_instance(
        &self,
        request: &CreateNatGatewayRequest,
    ) -> Result<NatGatewayInstance, NcloudError> {
        debug!("Creating NAT gateway in VPC {}", request.vpc_no);
        let list: NatGatewayInstanceList = self
            .vpc_action("createNatGatewayInstance", request.to_params())
            .await?;
        first_or_missing(list.nat_gateway_instance_list, "createNatGatewayInstance")
    }

    async fn get_nat_gateway_instance_list(
        &self,
        filter: &NatGatewayListFilter,
    ) -> Result<Vec<NatGatewayInstance>, NcloudError> {
        let list: NatGatewayInstanceList = self
            .vpc_action("getNatGatewayInstanceList", filter.to_params())
            .await?;
        Ok(list.nat_gateway_instance_list)
    }

    async fn set_nat_gateway_description(
        &self,
        nat_gateway_instance_no: &str,
        description: &str,
    ) -> Result<(), NcloudError> {
        let mut params = QueryParams::new();
        params
            .push("natGatewayInstanceNo", nat_gateway_instance_no)
            .push("natGatewayDescription", description);
        self.vpc_action::<serde_json::Value>("setNatGatewayDescription", params)
            .await
            .map(|_| ())
    }

    async fn delete_nat_gateway_instance(
        &self,
        nat_gateway_instance_no: &str,
    ) -> Result<(), NcloudError> {
        debug!("Deleting NAT gateway {}", nat_gateway_instance_no);
        let mut params = QueryParams::new();
        params.push("natGatewayInstanceNo", nat_gateway_instance_no);
        self.vpc_action::<serde_json::Value>("deleteNatGatewayInstance", params)
            .await
            .map(|_| ())
    }

    async fn create_nks_cluster(
        &self,
        request: &CreateNksClusterRequest,
    ) -> Result<String, NcloudError> {
        debug!("Creating NKS cluster {}", request.name);
        let body = serde_json::to_value(request)?;
        let created: CreateNksClusterResponse = self
            .http
            .rest_json(Method::POST, NKS_CLUSTERS, Some(&body))
            .await?;
        Ok(created.uuid)
    }

    async fn get_nks_cluster(&self, uuid: &str) -> Result<NksCluster, NcloudError> {
        let path = format!("{}/{}", NKS_CLUSTERS, urlencoding::encode(uuid));
        let envelope: NksClusterEnvelope = self.http.rest_json(Method::GET, &path, None).await?;
        Ok(envelope.cluster)
    }

    async fn get_nks_clusters(&self) -> Result<Vec<NksCluster>, NcloudError> {
        let envelope: NksClusterListEnvelope =
            self.http.rest_json(Method::GET, NKS_CLUSTERS, None).await?;
        Ok(envelope.clusters)
    }

    async fn upgrade_nks_cluster(&self, uuid: &str, k8s_version: &str) -> Result<(), NcloudError> {
        debug!("Upgrading NKS cluster {} to {}", uuid, k8s_version);
        let path = format!(
            "{}/{}/upgrade?k8sVersion={}",
            NKS_CLUSTERS,
            urlencoding::encode(uuid),
            urlencoding::encode(k8s_version)
        );
        self.http.rest_empty(Method::PATCH, &path, None).await
    }

    async fn delete_nks_cluster(&self, uuid: &str) -> Result<(), NcloudError> {
        debug!("Deleting NKS cluster {}", uuid);
        let path = format!("{}/{}", NKS_CLUSTERS, urlencoding::encode(uuid));
        self.http.rest_empty(Method::DELETE, &path, None).await
    }

    async fn get_nks_node_pools(&self, uuid: &str) -> Result<Vec<NodePool>, NcloudError> {
        let path = format!("{}/{}/node-pool", NKS_CLUSTERS, urlencoding::encode(uuid));
        let envelope: NodePoolListEnvelope = self.http.rest_json(Method::GET, &path, None).await?;
        Ok(envelope.node_pool)
    }
}
