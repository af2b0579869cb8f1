//! VPC networks. Nothing is mutable in place.

use super::validate;
use super::{ManagedResource, Reconciler};
use crate::error::ReconcileError;
use crate::lifecycle::{Handle, LifecycleState, ObservedState, StatusTable};
use ncloud_client::{
    CreateVpcRequest, DeploymentMode, NcloudClientTrait, NcloudError, Vpc, VpcListFilter,
};
use serde::{Deserialize, Serialize};

pub(crate) const NETWORK_STATUS: StatusTable = StatusTable {
    ready: &["RUN"],
    stopped: &[],
    failed: &[],
    terminated: &["TERMT"],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcSpec {
    pub name: String,
    pub ipv4_cidr_block: String,
}

#[derive(Debug)]
pub struct VpcResource;

#[async_trait::async_trait]
impl ManagedResource for VpcResource {
    type Spec = VpcSpec;
    type Observed = Vpc;

    const KIND: &'static str = "vpc";
    const MODES: &'static [DeploymentMode] = &[DeploymentMode::Vpc];

    fn validate(spec: &VpcSpec, _mode: DeploymentMode) -> Result<(), String> {
        validate::instance_name("name", &spec.name)?;
        validate::private_cidr("ipv4_cidr_block", &spec.ipv4_cidr_block, 16, 28)
    }

    async fn submit(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        spec: &VpcSpec,
    ) -> Result<Handle, NcloudError> {
        let request = CreateVpcRequest {
            vpc_name: spec.name.clone(),
            ipv4_cidr_block: spec.ipv4_cidr_block.clone(),
        };
        let vpc = client.create_vpc(&request).await?;
        Ok(Handle::new(vpc.vpc_no))
    }

    async fn describe(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        handle: &Handle,
    ) -> Result<Option<Vpc>, NcloudError> {
        let filter = VpcListFilter {
            vpc_nos: vec![handle.as_str().to_string()],
            ..Default::default()
        };
        let vpcs = client.get_vpc_list(&filter).await?;
        Ok(vpcs.into_iter().find(|v| v.vpc_no == handle.as_str()))
    }

    fn status(observed: &Vpc) -> String {
        observed.status_code().to_string()
    }

    fn classify(status: &str) -> LifecycleState {
        NETWORK_STATUS.classify(status)
    }

    fn immutable_changes(current: &VpcSpec, desired: &VpcSpec) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.name != desired.name {
            fields.push("name");
        }
        if current.ipv4_cidr_block != desired.ipv4_cidr_block {
            fields.push("ipv4_cidr_block");
        }
        fields
    }

    async fn apply_update(
        _reconciler: &Reconciler,
        _handle: &Handle,
        _current: &VpcSpec,
        _desired: &VpcSpec,
    ) -> Result<(), ReconcileError> {
        // Every field is creation-only
        Ok(())
    }

    async fn remove(
        reconciler: &Reconciler,
        handle: &Handle,
        _observed: &ObservedState<Vpc>,
    ) -> Result<(), ReconcileError> {
        reconciler
            .client()
            .delete_vpc(handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "delete", Some(handle), e))
    }
}
