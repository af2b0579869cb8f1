//! Subnets of a VPC. The network ACL can be swapped in place.

use super::validate;
use super::vpc::NETWORK_STATUS;
use super::{ManagedResource, Reconciler};
use crate::error::ReconcileError;
use crate::lifecycle::{Handle, LifecycleState, ObservedState};
use ncloud_client::{
    CreateSubnetRequest, DeploymentMode, NcloudClientTrait, NcloudError, Subnet, SubnetListFilter,
};
use serde::{Deserialize, Serialize};
use tracing::info;

const SUBNET_TYPES: &[&str] = &["PUBLIC", "PRIVATE"];
const USAGE_TYPES: &[&str] = &["GEN", "LOADB", "BM", "NATGW"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    pub vpc_no: String,
    pub zone: String,
    /// CIDR block inside the VPC range
    pub subnet: String,
    pub network_acl_no: String,
    /// `PUBLIC` or `PRIVATE`
    pub subnet_type: String,
    /// `GEN` (default), `LOADB`, `BM` or `NATGW`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_type: Option<String>,
}

#[derive(Debug)]
pub struct SubnetResource;

#[async_trait::async_trait]
impl ManagedResource for SubnetResource {
    type Spec = SubnetSpec;
    type Observed = Subnet;

    const KIND: &'static str = "subnet";
    const MODES: &'static [DeploymentMode] = &[DeploymentMode::Vpc];

    fn validate(spec: &SubnetSpec, _mode: DeploymentMode) -> Result<(), String> {
        validate::instance_name("name", &spec.name)?;
        validate::required("vpc_no", &spec.vpc_no)?;
        validate::required("zone", &spec.zone)?;
        validate::required("network_acl_no", &spec.network_acl_no)?;
        validate::private_cidr("subnet", &spec.subnet, 16, 28)?;
        validate::one_of("subnet_type", &spec.subnet_type, SUBNET_TYPES)?;
        if let Some(usage_type) = spec.usage_type.as_deref() {
            validate::one_of("usage_type", usage_type, USAGE_TYPES)?;
        }
        Ok(())
    }

    async fn submit(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        spec: &SubnetSpec,
    ) -> Result<Handle, NcloudError> {
        let request = CreateSubnetRequest {
            vpc_no: spec.vpc_no.clone(),
            zone_code: spec.zone.clone(),
            subnet_name: spec.name.clone(),
            subnet: spec.subnet.clone(),
            network_acl_no: spec.network_acl_no.clone(),
            subnet_type_code: spec.subnet_type.clone(),
            usage_type_code: spec.usage_type.clone(),
        };
        let subnet = client.create_subnet(&request).await?;
        Ok(Handle::new(subnet.subnet_no))
    }

    async fn describe(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        handle: &Handle,
    ) -> Result<Option<Subnet>, NcloudError> {
        let filter = SubnetListFilter {
            subnet_nos: vec![handle.as_str().to_string()],
            ..Default::default()
        };
        let subnets = client.get_subnet_list(&filter).await?;
        Ok(subnets.into_iter().find(|s| s.subnet_no == handle.as_str()))
    }

    fn status(observed: &Subnet) -> String {
        observed.status_code().to_string()
    }

    fn classify(status: &str) -> LifecycleState {
        NETWORK_STATUS.classify(status)
    }

    fn immutable_changes(current: &SubnetSpec, desired: &SubnetSpec) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.name != desired.name {
            fields.push("name");
        }
        if current.vpc_no != desired.vpc_no {
            fields.push("vpc_no");
        }
        if current.zone != desired.zone {
            fields.push("zone");
        }
        if current.subnet != desired.subnet {
            fields.push("subnet");
        }
        if current.subnet_type != desired.subnet_type {
            fields.push("subnet_type");
        }
        if current.usage_type != desired.usage_type {
            fields.push("usage_type");
        }
        fields
    }

    async fn apply_update(
        reconciler: &Reconciler,
        handle: &Handle,
        current: &SubnetSpec,
        desired: &SubnetSpec,
    ) -> Result<(), ReconcileError> {
        if current.network_acl_no == desired.network_acl_no {
            return Ok(());
        }
        info!("Setting network ACL {} on subnet {}", desired.network_acl_no, handle);
        reconciler
            .client()
            .set_subnet_network_acl(handle.as_str(), &desired.network_acl_no)
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "update", Some(handle), e))
    }

    async fn remove(
        reconciler: &Reconciler,
        handle: &Handle,
        _observed: &ObservedState<Subnet>,
    ) -> Result<(), ReconcileError> {
        reconciler
            .client()
            .delete_subnet(handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "delete", Some(handle), e))
    }
}
