//! Kubernetes clusters (NKS).
//!
//! The cluster uuid is the handle. Numeric vendor references (VPC, subnets)
//! are declared as strings so they can be filled from other resources'
//! handles, and are checked to be numeric before any call.

use super::validate;
use super::{ManagedResource, Reconciler};
use crate::error::ReconcileError;
use crate::lifecycle::{Handle, LifecycleState, ObservedState, StatusTable};
use ncloud_client::{CreateNksClusterRequest, DeploymentMode, NcloudClientTrait, NcloudError, NksCluster};
use serde::{Deserialize, Serialize};
use tracing::info;

const STATUS: StatusTable = StatusTable {
    ready: &["RUNNING"],
    stopped: &[],
    failed: &["ERROR"],
    terminated: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NksClusterSpec {
    pub name: String,
    /// Cluster size code, e.g. `SVR.VNKS.STAND.C002.M008.NET.SSD.B050.G002`
    pub cluster_type: String,
    pub login_key_name: String,
    /// Upgraded in place when changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s_version: Option<String>,
    pub zone: String,
    pub vpc_no: String,
    pub subnet_no_list: Vec<String>,
    pub lb_private_subnet_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_public_subnet_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_network_plugin: Option<String>,
}

impl NksClusterSpec {
    fn to_request(&self) -> Result<CreateNksClusterRequest, String> {
        Ok(CreateNksClusterRequest {
            name: self.name.clone(),
            cluster_type: self.cluster_type.clone(),
            login_key_name: self.login_key_name.clone(),
            k8s_version: self.k8s_version.clone(),
            zone_code: self.zone.clone(),
            vpc_no: validate::numeric("vpc_no", &self.vpc_no)?,
            subnet_no_list: self
                .subnet_no_list
                .iter()
                .map(|no| validate::numeric("subnet_no_list", no))
                .collect::<Result<_, _>>()?,
            lb_private_subnet_no: validate::numeric("lb_private_subnet_no", &self.lb_private_subnet_no)?,
            lb_public_subnet_no: self
                .lb_public_subnet_no
                .as_deref()
                .map(|no| validate::numeric("lb_public_subnet_no", no))
                .transpose()?,
            kube_network_plugin: self.kube_network_plugin.clone(),
        })
    }
}

#[derive(Debug)]
pub struct NksClusterResource;

#[async_trait::async_trait]
impl ManagedResource for NksClusterResource {
    type Spec = NksClusterSpec;
    type Observed = NksCluster;

    const KIND: &'static str = "nks_cluster";
    const MODES: &'static [DeploymentMode] = &[DeploymentMode::Vpc];

    fn validate(spec: &NksClusterSpec, _mode: DeploymentMode) -> Result<(), String> {
        validate::required("name", &spec.name)?;
        validate::required("cluster_type", &spec.cluster_type)?;
        validate::required("login_key_name", &spec.login_key_name)?;
        validate::required("zone", &spec.zone)?;
        if spec.subnet_no_list.is_empty() {
            return Err("subnet_no_list must name at least one subnet".to_string());
        }
        spec.to_request().map(|_| ())
    }

    async fn submit(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        spec: &NksClusterSpec,
    ) -> Result<Handle, NcloudError> {
        let request = spec.to_request().map_err(NcloudError::InvalidRequest)?;
        let uuid = client.create_nks_cluster(&request).await?;
        Ok(Handle::new(uuid))
    }

    async fn describe(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        handle: &Handle,
    ) -> Result<Option<NksCluster>, NcloudError> {
        match client.get_nks_cluster(handle.as_str()).await {
            Ok(cluster) => Ok(Some(cluster)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn status(observed: &NksCluster) -> String {
        observed.status.clone()
    }

    fn classify(status: &str) -> LifecycleState {
        STATUS.classify(status)
    }

    fn immutable_changes(current: &NksClusterSpec, desired: &NksClusterSpec) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.name != desired.name {
            fields.push("name");
        }
        if current.cluster_type != desired.cluster_type {
            fields.push("cluster_type");
        }
        if current.login_key_name != desired.login_key_name {
            fields.push("login_key_name");
        }
        if current.zone != desired.zone {
            fields.push("zone");
        }
        if current.vpc_no != desired.vpc_no {
            fields.push("vpc_no");
        }
        if current.subnet_no_list != desired.subnet_no_list {
            fields.push("subnet_no_list");
        }
        if current.lb_private_subnet_no != desired.lb_private_subnet_no {
            fields.push("lb_private_subnet_no");
        }
        if current.lb_public_subnet_no != desired.lb_public_subnet_no {
            fields.push("lb_public_subnet_no");
        }
        if current.kube_network_plugin != desired.kube_network_plugin {
            fields.push("kube_network_plugin");
        }
        fields
    }

    async fn apply_update(
        reconciler: &Reconciler,
        handle: &Handle,
        current: &NksClusterSpec,
        desired: &NksClusterSpec,
    ) -> Result<(), ReconcileError> {
        let Some(version) = desired.k8s_version.as_deref() else {
            return Ok(());
        };
        if current.k8s_version.as_deref() == Some(version) {
            return Ok(());
        }

        info!("Upgrading cluster {} to Kubernetes {}", handle, version);
        reconciler
            .client()
            .upgrade_nks_cluster(handle.as_str(), version)
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "update", Some(handle), e))
    }

    async fn remove(
        reconciler: &Reconciler,
        handle: &Handle,
        _observed: &ObservedState<NksCluster>,
    ) -> Result<(), ReconcileError> {
        reconciler
            .client()
            .delete_nks_cluster(handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "delete", Some(handle), e))
    }
}
