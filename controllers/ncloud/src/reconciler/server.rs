//! Server instances (classic `server` and VPC `vserver` APIs).
//!
//! The server product code is the only field changed in place. The vendor
//! only accepts a spec change on a stopped server, so an update runs
//! stop -> changeSpec -> start; deleting a running server stops it first.

use super::validate;
use super::{ManagedResource, Reconciler};
use crate::error::ReconcileError;
use crate::lifecycle::{Goal, Handle, LifecycleState, ObservedState, StatusTable};
use ncloud_client::{
    CreateServerRequest, DeploymentMode, NcloudClientTrait, NcloudError, ServerInstance,
    ServerListFilter,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const STATUS: StatusTable = StatusTable {
    ready: &["RUN"],
    stopped: &["NSTOP"],
    failed: &[],
    terminated: &["TERMT"],
};

/// Declared server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_product_code: String,
    /// Size; the only field changed in place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_key_name: Option<String>,
    /// Classic placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_no: Option<String>,
    /// VPC placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_no: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_control_group_nos: Vec<String>,
}

impl ServerSpec {
    fn to_request(&self) -> CreateServerRequest {
        CreateServerRequest {
            server_name: self.name.clone(),
            server_description: self.description.clone(),
            server_image_product_code: self.image_product_code.clone(),
            server_product_code: self.product_code.clone(),
            login_key_name: self.login_key_name.clone(),
            zone_no: self.zone_no.clone(),
            vpc_no: self.vpc_no.clone(),
            subnet_no: self.subnet_no.clone(),
            access_control_group_nos: self.access_control_group_nos.clone(),
        }
    }
}

/// Server instance lifecycle
#[derive(Debug)]
pub struct ServerResource;

impl ServerResource {
    async fn stop_and_wait(reconciler: &Reconciler, handle: &Handle) -> Result<(), ReconcileError> {
        info!("Stopping server {}", handle);
        reconciler
            .client()
            .stop_server_instance(reconciler.mode(), handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "stop", Some(handle), e))?;
        reconciler
            .await_state::<Self>(handle, Goal::Stopped, reconciler.timeouts().update)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ManagedResource for ServerResource {
    type Spec = ServerSpec;
    type Observed = ServerInstance;

    const KIND: &'static str = "server";
    const MODES: &'static [DeploymentMode] = &[DeploymentMode::Classic, DeploymentMode::Vpc];

    fn validate(spec: &ServerSpec, mode: DeploymentMode) -> Result<(), String> {
        validate::instance_name("name", &spec.name)?;
        validate::required("image_product_code", &spec.image_product_code)?;

        match mode {
            DeploymentMode::Classic => {
                validate::forbidden("vpc_no", spec.vpc_no.as_deref(), "in classic mode")?;
                validate::forbidden("subnet_no", spec.subnet_no.as_deref(), "in classic mode")?;
            }
            DeploymentMode::Vpc => {
                validate::required_opt("vpc_no", spec.vpc_no.as_deref(), "in VPC mode")?;
                validate::required_opt("subnet_no", spec.subnet_no.as_deref(), "in VPC mode")?;
                validate::forbidden("zone_no", spec.zone_no.as_deref(), "in VPC mode (placement follows the subnet)")?;
            }
        }
        Ok(())
    }

    async fn submit(
        client: &dyn NcloudClientTrait,
        mode: DeploymentMode,
        spec: &ServerSpec,
    ) -> Result<Handle, NcloudError> {
        let server = client.create_server_instance(mode, &spec.to_request()).await?;
        if server.server_instance_no.is_empty() {
            return Err(NcloudError::Api {
                status: 200,
                code: "empty-response".to_string(),
                message: "createServerInstances returned no serverInstanceNo".to_string(),
            });
        }
        Ok(Handle::new(server.server_instance_no))
    }

    async fn describe(
        client: &dyn NcloudClientTrait,
        mode: DeploymentMode,
        handle: &Handle,
    ) -> Result<Option<ServerInstance>, NcloudError> {
        let servers = client
            .get_server_instance_list(mode, &ServerListFilter::by_instance_no(handle.as_str()))
            .await?;
        Ok(servers
            .into_iter()
            .find(|s| s.server_instance_no == handle.as_str()))
    }

    fn status(observed: &ServerInstance) -> String {
        observed.status_code().to_string()
    }

    fn classify(status: &str) -> LifecycleState {
        STATUS.classify(status)
    }

    fn immutable_changes(current: &ServerSpec, desired: &ServerSpec) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if current.name != desired.name {
            fields.push("name");
        }
        if current.description != desired.description {
            fields.push("description");
        }
        if current.image_product_code != desired.image_product_code {
            fields.push("image_product_code");
        }
        if current.login_key_name != desired.login_key_name {
            fields.push("login_key_name");
        }
        if current.zone_no != desired.zone_no {
            fields.push("zone_no");
        }
        if current.vpc_no != desired.vpc_no {
            fields.push("vpc_no");
        }
        if current.subnet_no != desired.subnet_no {
            fields.push("subnet_no");
        }
        if current.access_control_group_nos != desired.access_control_group_nos {
            fields.push("access_control_group_nos");
        }
        fields
    }

    async fn apply_update(
        reconciler: &Reconciler,
        handle: &Handle,
        _current: &ServerSpec,
        desired: &ServerSpec,
    ) -> Result<(), ReconcileError> {
        let Some(product_code) = desired.product_code.as_deref() else {
            warn!("Server {}: product_code removed from spec, keeping the current size", handle);
            return Ok(());
        };

        let observed = reconciler.read::<Self>(handle).await?;
        if observed.resource.server_product_code.as_deref() != Some(product_code) {
            if observed.state != LifecycleState::Stopped {
                Self::stop_and_wait(reconciler, handle).await?;
            }

            info!("Changing server {} product to {}", handle, product_code);
            reconciler
                .client()
                .change_server_instance_spec(reconciler.mode(), handle.as_str(), product_code)
                .await
                .map_err(|e| ReconcileError::remote(Self::KIND, "update", Some(handle), e))?;
            reconciler
                .await_state::<Self>(handle, Goal::Stopped, reconciler.timeouts().update)
                .await?;
        } else if observed.state == LifecycleState::Ready {
            return Ok(());
        }

        info!("Starting server {}", handle);
        reconciler
            .client()
            .start_server_instance(reconciler.mode(), handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "start", Some(handle), e))
    }

    async fn remove(
        reconciler: &Reconciler,
        handle: &Handle,
        observed: &ObservedState<ServerInstance>,
    ) -> Result<(), ReconcileError> {
        if observed.state == LifecycleState::Ready {
            Self::stop_and_wait(reconciler, handle).await?;
        }

        reconciler
            .client()
            .terminate_server_instance(reconciler.mode(), handle.as_str())
            .await
            .map_err(|e| ReconcileError::remote(Self::KIND, "delete", Some(handle), e))
    }
}
