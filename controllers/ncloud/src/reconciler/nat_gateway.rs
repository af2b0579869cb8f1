//! NAT gateways of a VPC. Only the description is mutable.

use super::validate;
use super::vpc::NETWORK_STATUS;
use super::{ManagedResource, Reconciler};
use crate::error::ReconcileError;
use crate::lifecycle::{Handle, LifecycleState, ObservedState};
use ncloud_client::{
    CreateNatGatewayRequest, DeploymentMode, NatGatewayInstance, NatGatewayListFilter,
    NcloudClientTrait, NcloudError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatGatewaySpec {
    pub vpc_no: String,
    pub zone: String,
    /// Assigned by the vendor when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct NatGatewayResource;

#[async_trait::async_trait]
impl ManagedResource for NatGatewayResource {
    type Spec = NatGatewaySpec;
    type Observed = NatGatewayInstance;

    const KIND: &'static str = "nat_gateway";
    const MODES: &'static [DeploymentMode] = &[DeploymentMode::Vpc];

    fn validate(spec: &NatGatewaySpec, _mode: DeploymentMode) -> Result<(), String> {
        validate::required("vpc_no", &spec.vpc_no)?;
        validate::required("zone", &spec.zone)?;
        if let Some(name) = spec.name.as_deref() {
            validate::instance_name("name", name)?;
        }
        Ok(())
    }

    async fn submit(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        spec: &NatGatewaySpec,
    ) -> Result<Handle, NcloudError> {
        let request = CreateNatGatewayRequest {
            vpc_no: spec.vpc_no.clone(),
            zone_code: spec.zone.clone(),
            nat_gateway_name: spec.name.clone(),
            nat_gateway_description: spec.description.clone(),
        };
        let nat_gateway = client.create_nat_gateway_instance(&request).await?;
        Ok(Handle::new(nat_gateway.nat_gateway_instance_no))
    }

    async fn describe(
        client: &dyn NcloudClientTrait,
        _mode: DeploymentMode,
        handle: &Handle,
    ) -> Result<Option<NatGatewayInstance>, NcloudError> {
        let filter = NatGatewayListFilter {
            nat_gateway_instance_nos: vec![handle.as_str().to_string()],
            ..Default::default()
        };
        let nat_gateways = client.get_nat_gateway_instance_list(&filter).await?;
        Ok(nat_gateways
            .into_iter()
            .find(|n| n.nat_gateway_instance_no == handle.as_str()))
    }

    fn status(observed: &NatGatewayInstance) -> String {
        observed.status_code().to_string()
    }

    fn classify(status: &str) -> LifecycleState {
        NETWORK_STATUS.classify(status)
    }

    fn immutable_changes(current: &NatGatewaySpec, desired: &NatGatewaySpec) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.vpc_no != desired.vpc_no {
            fields.push("vpc_no");
        }
        if current.zone != desired.zone {
            fields.push("zone");
        }
        if current.name != desired.name {
            fields.push("name");
        }
        fields
    }

    async fn apply_update(
        reconciler: &Reconciler,
        handle: &Handle,
        _current: &NatGatewaySpec,
        desired: &NatGatewaySpec,
    ) -> Result<(), ReconcileError> {
        reconciler
            .client()
            .set_nat_gateway_description(handle.as_str(), desired.description.as_deref().unwrap_or_default())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "update", Some(handle), e))
    }

    async fn remove(
        reconciler: &Reconciler,
        handle: &Handle,
        _observed: &ObservedState<NatGatewayInstance>,
    ) -> Result<(), ReconcileError> {
        reconciler
            .client()
            .delete_nat_gateway_instance(handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "delete", Some(handle), e))
    }
}
