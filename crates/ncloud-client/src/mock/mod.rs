//! Mock NcloudClient for unit testing
//!
//! This module provides a mock implementation of NcloudClientTrait that can be
//! used in unit tests without NCloud credentials.
//!
//! Resources move through scripted status progressions: every get/list that
//! returns a resource consumes one step, so reconciler polling is observable
//! without real time passing. The mock is organized by vendor API:
//! - `server.rs` - server instances and classic port forwarding
//! - `vpc.rs` - VPCs, subnets and NAT gateways
//! - `nks.rs` - Kubernetes clusters and node pools
//! - `status.rs` - status code bookkeeping per model
//! - `store.rs` - the step-driven resource store

mod nks;
mod server;
mod status;
mod store;
mod vpc;

use crate::error::NcloudError;
use crate::models::*;
use crate::ncloud_trait::NcloudClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use store::MockStore;

/// Resource families with scripted progressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockKind {
    Server,
    Vpc,
    Subnet,
    NatGateway,
    NksCluster,
}

/// Vendor operation a progression is played after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockPhase {
    Create,
    Delete,
    /// In-place change (spec change, ACL swap, description, upgrade)
    Update,
    Stop,
    Start,
}

fn default_progression(kind: MockKind, phase: MockPhase) -> &'static [&'static str] {
    match (kind, phase) {
        (MockKind::Server, MockPhase::Create) => &["INIT", "CREAT", "RUN"],
        (MockKind::Server, MockPhase::Delete) => &["TERMTING"],
        (MockKind::Server, MockPhase::Stop) => &["SHTDN", "NSTOP"],
        (MockKind::Server, MockPhase::Start) => &["BOOT", "RUN"],
        (MockKind::Server, MockPhase::Update) => &["NSTOP"],
        (MockKind::NksCluster, MockPhase::Create) => &["CREATING", "CREATING", "RUNNING"],
        (MockKind::NksCluster, MockPhase::Delete) => &["DELETING"],
        (MockKind::NksCluster, MockPhase::Update) => &["UPGRADING", "RUNNING"],
        (_, MockPhase::Create) => &["INIT", "CREATING", "RUN"],
        (_, MockPhase::Delete) => &["TERMTING"],
        (_, MockPhase::Update) => &["RUN"],
        (_, MockPhase::Stop) | (_, MockPhase::Start) => &[],
    }
}

/// Lock a store, recovering the data of a poisoned mutex
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock NcloudClient for testing
///
/// Stores resources in memory, records every call and can be told to reject
/// the next invocation of an operation.
#[derive(Clone, Debug)]
pub struct MockNcloudClient {
    pub(crate) region: String,
    pub(crate) servers: Arc<Mutex<MockStore<ServerInstance>>>,
    pub(crate) port_forwarding: Arc<Mutex<PortForwardingRuleList>>,
    pub(crate) vpcs: Arc<Mutex<MockStore<Vpc>>>,
    pub(crate) subnets: Arc<Mutex<MockStore<Subnet>>>,
    pub(crate) nat_gateways: Arc<Mutex<MockStore<NatGatewayInstance>>>,
    pub(crate) nks_clusters: Arc<Mutex<MockStore<NksCluster>>>,
    pub(crate) node_pools: Arc<Mutex<HashMap<String, Vec<NodePool>>>>,
    progressions: Arc<Mutex<HashMap<(MockKind, MockPhase), Vec<String>>>>,
    rejections: Arc<Mutex<HashMap<String, (String, String)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    next_id: Arc<Mutex<u64>>,
}

impl Default for MockNcloudClient {
    fn default() -> Self {
        Self::new("KR")
    }
}

impl MockNcloudClient {
    /// Create a new, empty mock client
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            servers: Arc::default(),
            port_forwarding: Arc::default(),
            vpcs: Arc::default(),
            subnets: Arc::default(),
            nat_gateways: Arc::default(),
            nks_clusters: Arc::default(),
            node_pools: Arc::default(),
            progressions: Arc::default(),
            rejections: Arc::default(),
            calls: Arc::default(),
            next_id: Arc::new(Mutex::new(812_000)),
        }
    }

    /// Override the statuses played after `phase` for `kind`
    pub fn set_progression(&self, kind: MockKind, phase: MockPhase, statuses: &[&str]) {
        lock(&self.progressions).insert(
            (kind, phase),
            statuses.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub(crate) fn progression(&self, kind: MockKind, phase: MockPhase) -> Vec<String> {
        lock(&self.progressions)
            .get(&(kind, phase))
            .cloned()
            .unwrap_or_else(|| {
                default_progression(kind, phase)
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    /// Make the next call of `operation` fail with a vendor error
    pub fn reject_next(&self, operation: &str, code: &str, message: &str) {
        lock(&self.rejections).insert(
            operation.to_string(),
            (code.to_string(), message.to_string()),
        );
    }

    /// Operations invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of times `operation` was invoked
    pub fn calls_to(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == operation).count()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Record a call and return an injected rejection, if any
    pub(crate) fn enter(&self, operation: &str) -> Result<(), NcloudError> {
        lock(&self.calls).push(operation.to_string());
        match lock(&self.rejections).remove(operation) {
            Some((code, message)) => Err(NcloudError::Api {
                status: 400,
                code,
                message,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        let mut id = lock(&self.next_id);
        *id += 1;
        *id
    }

    // Test setup and inspection. None of these count as calls or consume
    // progression steps.

    /// Add a server to the mock store (for test setup)
    pub fn insert_server(&self, server: ServerInstance) {
        let key = server.server_instance_no.clone();
        lock(&self.servers).insert(key, server);
    }

    /// Current server state without advancing its progression
    pub fn server(&self, server_instance_no: &str) -> Option<ServerInstance> {
        lock(&self.servers).peek(server_instance_no)
    }

    /// Delete a server behind the reconciler's back
    pub fn remove_server(&self, server_instance_no: &str) -> Option<ServerInstance> {
        lock(&self.servers).remove(server_instance_no)
    }

    pub fn server_count(&self) -> usize {
        lock(&self.servers).len()
    }

    /// Replace the classic port-forwarding configuration
    pub fn set_port_forwarding_rules(&self, rules: PortForwardingRuleList) {
        *lock(&self.port_forwarding) = rules;
    }

    pub fn insert_vpc(&self, vpc: Vpc) {
        let key = vpc.vpc_no.clone();
        lock(&self.vpcs).insert(key, vpc);
    }

    pub fn vpc(&self, vpc_no: &str) -> Option<Vpc> {
        lock(&self.vpcs).peek(vpc_no)
    }

    pub fn insert_subnet(&self, subnet: Subnet) {
        let key = subnet.subnet_no.clone();
        lock(&self.subnets).insert(key, subnet);
    }

    pub fn subnet(&self, subnet_no: &str) -> Option<Subnet> {
        lock(&self.subnets).peek(subnet_no)
    }

    pub fn insert_nat_gateway(&self, nat_gateway: NatGatewayInstance) {
        let key = nat_gateway.nat_gateway_instance_no.clone();
        lock(&self.nat_gateways).insert(key, nat_gateway);
    }

    pub fn nat_gateway(&self, nat_gateway_instance_no: &str) -> Option<NatGatewayInstance> {
        lock(&self.nat_gateways).peek(nat_gateway_instance_no)
    }

    pub fn insert_nks_cluster(&self, cluster: NksCluster) {
        let key = cluster.uuid.clone();
        lock(&self.nks_clusters).insert(key, cluster);
    }

    pub fn nks_cluster(&self, uuid: &str) -> Option<NksCluster> {
        lock(&self.nks_clusters).peek(uuid)
    }

    pub fn remove_nks_cluster(&self, uuid: &str) -> Option<NksCluster> {
        lock(&self.nks_clusters).remove(uuid)
    }

    /// Attach a node pool to a cluster (for test setup)
    pub fn add_node_pool(&self, uuid: &str, node_pool: NodePool) {
        lock(&self.node_pools)
            .entry(uuid.to_string())
            .or_default()
            .push(node_pool);
    }
}

#[async_trait::async_trait]
impl NcloudClientTrait for MockNcloudClient {
    fn region(&self) -> &str {
        &self.region
    }

    // Server operations - delegated to server module
    async fn create_server_instance(&self, mode: DeploymentMode, request: &CreateServerRequest) -> Result<ServerInstance, NcloudError> {
        server::create_server_instance(self, mode, request)
    }

    async fn get_server_instance_list(&self, mode: DeploymentMode, filter: &ServerListFilter) -> Result<Vec<ServerInstance>, NcloudError> {
        server::get_server_instance_list(self, mode, filter)
    }

    async fn stop_server_instance(&self, mode: DeploymentMode, server_instance_no: &str) -> Result<(), NcloudError> {
        server::stop_server_instance(self, mode, server_instance_no)
    }

    async fn start_server_instance(&self, mode: DeploymentMode, server_instance_no: &str) -> Result<(), NcloudError> {
        server::start_server_instance(self, mode, server_instance_no)
    }

    async fn change_server_instance_spec(&self, mode: DeploymentMode, server_instance_no: &str, server_product_code: &str) -> Result<(), NcloudError> {
        server::change_server_instance_spec(self, mode, server_instance_no, server_product_code)
    }

    async fn terminate_server_instance(&self, mode: DeploymentMode, server_instance_no: &str) -> Result<(), NcloudError> {
        server::terminate_server_instance(self, mode, server_instance_no)
    }

    async fn get_port_forwarding_rule_list(&self, filter: &PortForwardingRuleFilter) -> Result<PortForwardingRuleList, NcloudError> {
        server::get_port_forwarding_rule_list(self, filter)
    }

    // VPC operations - delegated to vpc module
    async fn create_vpc(&self, request: &CreateVpcRequest) -> Result<Vpc, NcloudError> {
        vpc::create_vpc(self, request)
    }

    async fn get_vpc_list(&self, filter: &VpcListFilter) -> Result<Vec<Vpc>, NcloudError> {
        vpc::get_vpc_list(self, filter)
    }

    async fn delete_vpc(&self, vpc_no: &str) -> Result<(), NcloudError> {
        vpc::delete_vpc(self, vpc_no)
    }

    async fn create_subnet(&self, request: &CreateSubnetRequest) -> Result<Subnet, NcloudError> {
        vpc::create_subnet(self, request)
    }

    async fn get_subnet_list(&self, filter: &SubnetListFilter) -> Result<Vec<Subnet>, NcloudError> {
        vpc::get_subnet_list(self, filter)
    }

    async fn set_subnet_network_acl(&self, subnet_no: &str, network_acl_no: &str) -> Result<(), NcloudError> {
        vpc::set_subnet_network_acl(self, subnet_no, network_acl_no)
    }

    async fn delete_subnet(&self, subnet_no: &str) -> Result<(), NcloudError> {
        vpc::delete_subnet(self, subnet_no)
    }

    async fn create_nat_gateway_instance(&self, request: &CreateNatGatewayRequest) -> Result<NatGatewayInstance, NcloudError> {
        vpc::create_nat_gateway_instance(self, request)
    }

    async fn get_nat_gateway_instance_list(&self, filter: &NatGatewayListFilter) -> Result<Vec<NatGatewayInstance>, NcloudError> {
        vpc::get_nat_gateway_instance_list(self, filter)
    }

    async fn set_nat_gateway_description(&self, nat_gateway_instance_no: &str, description: &str) -> Result<(), NcloudError> {
        vpc::set_nat_gateway_description(self, nat_gateway_instance_no, description)
    }

    async fn delete_nat_gateway_instance(&self, nat_gateway_instance_no: &str) -> Result<(), NcloudError> {
        vpc::delete_nat_gateway_instance(self, nat_gateway_instance_no)
    }

    // Kubernetes service - delegated to nks module
    async fn create_nks_cluster(&self, request: &CreateNksClusterRequest) -> Result<String, NcloudError> {
        nks::create_nks_cluster(self, request)
    }

    async fn get_nks_cluster(&self, uuid: &str) -> Result<NksCluster, NcloudError> {
        nks::get_nks_cluster(self, uuid)
    }

    async fn get_nks_clusters(&self) -> Result<Vec<NksCluster>, NcloudError> {
        nks::get_nks_clusters(self)
    }

    async fn upgrade_nks_cluster(&self, uuid: &str, k8s_version: &str) -> Result<(), NcloudError> {
        nks::upgrade_nks_cluster(self, uuid, k8s_version)
    }

    async fn delete_nks_cluster(&self, uuid: &str) -> Result<(), NcloudError> {
        nks::delete_nks_cluster(self, uuid)
    }

    async fn get_nks_node_pools(&self, uuid: &str) -> Result<Vec<NodePool>, NcloudError> {
        nks::get_nks_node_pools(self, uuid)
    }
}
