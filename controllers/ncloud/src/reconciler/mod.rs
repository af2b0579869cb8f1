//! Reconciliation logic for NCloud resources.
//!
//! Every kind implements [`ManagedResource`]; the [`Reconciler`] drives any
//! of them through create, await, read, update and delete. This module is
//! organized by vendor API:
//! - `server`: server instances (classic and VPC)
//! - `vpc`, `subnet`, `nat_gateway`: VPC networking
//! - `nks`: Kubernetes clusters

pub mod nat_gateway;
pub mod nks;
pub mod server;
pub mod subnet;
pub mod validate;
pub mod vpc;

mod network_test;
mod nks_test;
mod server_test;

use crate::config::{PollSettings, ProviderConfig, Timeouts};
use crate::error::ReconcileError;
use crate::lifecycle::{Goal, Handle, LifecycleState, ObservedState};
use crate::poll::{PollRequest, poll_until};
use ncloud_client::{DeploymentMode, NcloudClientTrait, NcloudError};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use nat_gateway::{NatGatewayResource, NatGatewaySpec};
pub use nks::{NksClusterResource, NksClusterSpec};
pub use server::{ServerResource, ServerSpec};
pub use subnet::{SubnetResource, SubnetSpec};
pub use vpc::{VpcResource, VpcSpec};

/// One kind of remote resource the reconciler can manage.
///
/// Implementations are stateless: everything they need arrives through the
/// arguments, including the shared client.
#[async_trait::async_trait]
pub trait ManagedResource: Send + Sync + 'static {
    /// Declared, user-supplied fields
    type Spec: Clone + Debug + PartialEq + Send + Sync;
    /// What describe returns
    type Observed: Clone + Debug + Send + Sync;

    /// Kind name used in logs and errors (`server`, `vpc`, ...)
    const KIND: &'static str;
    /// Deployment modes the vendor offers this kind in
    const MODES: &'static [DeploymentMode];

    /// Check mode-dependent required and forbidden fields.
    /// Returns the problem description on failure.
    fn validate(spec: &Self::Spec, mode: DeploymentMode) -> Result<(), String>;

    /// Issue the create call and return the vendor handle
    async fn submit(
        client: &dyn NcloudClientTrait,
        mode: DeploymentMode,
        spec: &Self::Spec,
    ) -> Result<Handle, NcloudError>;

    /// Fetch the current state; `Ok(None)` when the handle does not resolve
    async fn describe(
        client: &dyn NcloudClientTrait,
        mode: DeploymentMode,
        handle: &Handle,
    ) -> Result<Option<Self::Observed>, NcloudError>;

    /// Raw vendor status code of an observation
    fn status(observed: &Self::Observed) -> String;

    /// Map a vendor status code onto the lifecycle
    fn classify(status: &str) -> LifecycleState;

    /// Names of creation-only fields that differ between the two specs
    fn immutable_changes(current: &Self::Spec, desired: &Self::Spec) -> Vec<&'static str>;

    /// Apply the mutable differences in place. Only called when
    /// `immutable_changes` is empty and the specs differ.
    async fn apply_update(
        reconciler: &Reconciler,
        handle: &Handle,
        current: &Self::Spec,
        desired: &Self::Spec,
    ) -> Result<(), ReconcileError>;

    /// Issue the delete call(s) for a resource known to exist
    async fn remove(
        reconciler: &Reconciler,
        handle: &Handle,
        observed: &ObservedState<Self::Observed>,
    ) -> Result<(), ReconcileError>;
}

/// Drives managed resources towards their declared state.
///
/// Holds the shared client and the explicit provider configuration; no
/// mutable state is shared between operations.
#[derive(Clone)]
pub struct Reconciler {
    client: Arc<dyn NcloudClientTrait>,
    mode: DeploymentMode,
    poll: PollSettings,
    timeouts: Timeouts,
    cancel: CancellationToken,
}

impl Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("region", &self.client.region())
            .field("mode", &self.mode)
            .field("poll", &self.poll)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Arc<dyn NcloudClientTrait>, config: &ProviderConfig) -> Self {
        Self {
            client,
            mode: config.mode(),
            poll: config.poll,
            timeouts: config.timeouts,
            cancel: CancellationToken::new(),
        }
    }

    /// Make every wait abort when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub(crate) fn client(&self) -> &dyn NcloudClientTrait {
        self.client.as_ref()
    }

    /// Reject kinds the active mode does not offer
    pub(crate) fn require_mode<R: ManagedResource>(&self) -> Result<(), ReconcileError> {
        self.require_modes(R::KIND, R::MODES)
    }

    pub(crate) fn require_modes(
        &self,
        kind: &'static str,
        modes: &[DeploymentMode],
    ) -> Result<(), ReconcileError> {
        if modes.contains(&self.mode) {
            Ok(())
        } else {
            Err(ReconcileError::validation(
                kind,
                format!("{} is not supported in {} mode", kind, self.mode),
            ))
        }
    }

    fn validate<R: ManagedResource>(&self, spec: &R::Spec) -> Result<(), ReconcileError> {
        self.require_mode::<R>()?;
        R::validate(spec, self.mode).map_err(|message| ReconcileError::validation(R::KIND, message))
    }

    /// Describe once and classify
    pub(crate) async fn observe<R: ManagedResource>(
        &self,
        handle: &Handle,
    ) -> Result<Option<ObservedState<R::Observed>>, ReconcileError> {
        let described = match R::describe(self.client(), self.mode, handle).await {
            Ok(described) => described,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(ReconcileError::remote(R::KIND, "describe", Some(handle), e)),
        };

        Ok(described.map(|resource| {
            let status = R::status(&resource);
            ObservedState {
                handle: handle.clone(),
                state: R::classify(&status),
                status,
                resource,
            }
        }))
    }

    /// Validate the spec and issue exactly one create call.
    ///
    /// No network call is made when validation fails.
    pub async fn create<R: ManagedResource>(&self, spec: &R::Spec) -> Result<Handle, ReconcileError> {
        self.validate::<R>(spec)?;

        debug!("Creating {} in {} mode: {:?}", R::KIND, self.mode, spec);
        let handle = R::submit(self.client(), self.mode, spec)
            .await
            .map_err(|e| ReconcileError::remote(R::KIND, "create", None, e))?;

        info!("Created {} {}", R::KIND, handle);
        Ok(handle)
    }

    /// Poll until `goal` is reached, a failure status is seen, or `timeout` elapses
    pub async fn await_state<R: ManagedResource>(
        &self,
        handle: &Handle,
        goal: Goal,
        timeout: Duration,
    ) -> Result<Option<ObservedState<R::Observed>>, ReconcileError> {
        let request = PollRequest {
            kind: R::KIND,
            handle,
            goal,
            timeout,
            settings: &self.poll,
            cancel: &self.cancel,
        };
        poll_until(request, || self.observe::<R>(handle)).await
    }

    /// Wait for a freshly created or updated resource to become ready
    pub async fn await_ready<R: ManagedResource>(
        &self,
        handle: &Handle,
    ) -> Result<ObservedState<R::Observed>, ReconcileError> {
        self.await_state::<R>(handle, Goal::Ready, self.timeouts.create)
            .await?
            .ok_or_else(|| ReconcileError::not_found(R::KIND, handle.as_str()))
    }

    /// Create and wait until ready
    pub async fn provision<R: ManagedResource>(
        &self,
        spec: &R::Spec,
    ) -> Result<ObservedState<R::Observed>, ReconcileError> {
        let handle = self.create::<R>(spec).await?;
        self.await_ready::<R>(&handle).await
    }

    /// Single describe. Terminated resources read as `NotFound`.
    pub async fn read<R: ManagedResource>(
        &self,
        handle: &Handle,
    ) -> Result<ObservedState<R::Observed>, ReconcileError> {
        match self.observe::<R>(handle).await? {
            Some(observed) if observed.state != LifecycleState::Absent => Ok(observed),
            _ => Err(ReconcileError::not_found(R::KIND, handle.as_str())),
        }
    }

    /// Bring an existing resource from `current` to `desired`.
    ///
    /// Creation-only field changes are rejected with `ImmutableFieldChanged`
    /// before any network call.
    pub async fn update<R: ManagedResource>(
        &self,
        handle: &Handle,
        current: &R::Spec,
        desired: &R::Spec,
    ) -> Result<ObservedState<R::Observed>, ReconcileError> {
        let fields = R::immutable_changes(current, desired);
        if !fields.is_empty() {
            return Err(ReconcileError::ImmutableFieldChanged {
                kind: R::KIND,
                handle: handle.clone(),
                fields,
            });
        }
        self.validate::<R>(desired)?;

        if current == desired {
            debug!("{} {} is up to date", R::KIND, handle);
            return self.read::<R>(handle).await;
        }

        info!("Updating {} {}", R::KIND, handle);
        R::apply_update(self, handle, current, desired).await?;
        self.await_state::<R>(handle, Goal::Ready, self.timeouts.update)
            .await?
            .ok_or_else(|| ReconcileError::not_found(R::KIND, handle.as_str()))
    }

    /// Issue the delete. An already-absent handle is a successful no-op.
    pub async fn delete<R: ManagedResource>(&self, handle: &Handle) -> Result<(), ReconcileError> {
        self.require_mode::<R>()?;

        let observed = match self.observe::<R>(handle).await? {
            Some(observed) if observed.state != LifecycleState::Absent => observed,
            _ => {
                info!("{} {} already absent, nothing to delete", R::KIND, handle);
                return Ok(());
            }
        };

        info!("Deleting {} {} (status {})", R::KIND, handle, observed.status);
        match R::remove(self, handle, &observed).await {
            Err(e) if e.is_not_found() => {
                warn!("{} {} vanished during delete", R::KIND, handle);
                Ok(())
            }
            other => other,
        }
    }

    /// Wait until the handle no longer resolves or classifies as terminated
    pub async fn await_absence<R: ManagedResource>(&self, handle: &Handle) -> Result<(), ReconcileError> {
        self.await_state::<R>(handle, Goal::Absent, self.timeouts.delete)
            .await
            .map(|_| ())
    }

    /// Delete and wait for absence
    pub async fn destroy<R: ManagedResource>(&self, handle: &Handle) -> Result<(), ReconcileError> {
        self.delete::<R>(handle).await?;
        self.await_absence::<R>(handle).await?;
        info!("{} {} destroyed", R::KIND, handle);
        Ok(())
    }
}
