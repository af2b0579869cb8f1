//! Main controller implementation.
//!
//! The `Controller` walks a manifest in declaration order and brings each
//! resource to its declared spec, keeping the state file in step:
//! - no record: create, persist the handle, await ready, persist the status
//! - record gone remotely (drift) or in a failure status: create again
//! - mutable changes: update in place
//! - creation-only changes or a different kind: destroy and create
//!
//! Records that left the manifest are destroyed in reverse order.
//!
//! Declared lookups (`data`) only read: `lookup` resolves their references
//! against recorded handles and returns each result as JSON.

use crate::error::{ControllerError, ReconcileError};
use crate::lifecycle::{Handle, LifecycleState};
use crate::manifest::{LookupQuery, Manifest, ResourceSpec};
use crate::reconciler::{
    ManagedResource, NatGatewayResource, NksClusterResource, Reconciler, ServerResource,
    SubnetResource, VpcResource,
};
use crate::store::{ResourceRecord, StateStore};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{info, warn};

/// Run `$body` with `$R` bound to the resource type of `$kind`
macro_rules! for_kind {
    ($kind:expr, $R:ident => $body:expr) => {
        match $kind {
            "server" => {
                type $R = ServerResource;
                $body
            }
            "vpc" => {
                type $R = VpcResource;
                $body
            }
            "subnet" => {
                type $R = SubnetResource;
                $body
            }
            "nat_gateway" => {
                type $R = NatGatewayResource;
                $body
            }
            "nks_cluster" => {
                type $R = NksClusterResource;
                $body
            }
            other => Err(ControllerError::InvalidManifest(format!(
                "unknown resource kind {:?}",
                other
            ))),
        }
    };
}

/// Links a managed kind to its manifest variant
trait Declared: ManagedResource {
    fn spec_of(spec: &ResourceSpec) -> Option<&Self::Spec>;
}

impl Declared for ServerResource {
    fn spec_of(spec: &ResourceSpec) -> Option<&Self::Spec> {
        match spec {
            ResourceSpec::Server(s) => Some(s),
            _ => None,
        }
    }
}

impl Declared for VpcResource {
    fn spec_of(spec: &ResourceSpec) -> Option<&Self::Spec> {
        match spec {
            ResourceSpec::Vpc(s) => Some(s),
            _ => None,
        }
    }
}

impl Declared for SubnetResource {
    fn spec_of(spec: &ResourceSpec) -> Option<&Self::Spec> {
        match spec {
            ResourceSpec::Subnet(s) => Some(s),
            _ => None,
        }
    }
}

impl Declared for NatGatewayResource {
    fn spec_of(spec: &ResourceSpec) -> Option<&Self::Spec> {
        match spec {
            ResourceSpec::NatGateway(s) => Some(s),
            _ => None,
        }
    }
}

impl Declared for NksClusterResource {
    fn spec_of(spec: &ResourceSpec) -> Option<&Self::Spec> {
        match spec {
            ResourceSpec::NksCluster(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Replaced,
    Unchanged,
}

/// What an apply did, by resource name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub replaced: Vec<String>,
    pub unchanged: Vec<String>,
    pub destroyed: Vec<String>,
}

impl ApplySummary {
    fn record(&mut self, name: &str, outcome: Outcome) {
        let bucket = match outcome {
            Outcome::Created => &mut self.created,
            Outcome::Updated => &mut self.updated,
            Outcome::Replaced => &mut self.replaced,
            Outcome::Unchanged => &mut self.unchanged,
        };
        bucket.push(name.to_string());
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} replaced, {} unchanged, {} destroyed",
            self.created.len(),
            self.updated.len(),
            self.replaced.len(),
            self.unchanged.len(),
            self.destroyed.len()
        )
    }
}

/// Reconciles a manifest against NCloud and the local state file.
pub struct Controller {
    reconciler: Reconciler,
    store: StateStore,
}

impl Controller {
    pub fn new(reconciler: Reconciler, store: StateStore) -> Self {
        Self { reconciler, store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Bring every declared resource to its spec, then destroy orphans
    pub async fn apply(&mut self, manifest: &Manifest) -> Result<ApplySummary, ControllerError> {
        let mut summary = ApplySummary::default();
        let mut handles: HashMap<String, Handle> = HashMap::new();

        for declared in &manifest.resources {
            let spec = declared.spec.resolve_references(&declared.name, |name| {
                handles.get(name).map(|h| h.as_str().to_string())
            })?;

            let (outcome, handle) =
                for_kind!(spec.kind(), R => self.apply_kind::<R>(&declared.name, spec).await)?;
            summary.record(&declared.name, outcome);
            handles.insert(declared.name.clone(), handle);
        }

        let declared: HashSet<&str> = manifest.resources.iter().map(|r| r.name.as_str()).collect();
        let orphans: Vec<ResourceRecord> = self
            .store
            .records()
            .iter()
            .rev()
            .filter(|r| !declared.contains(r.name.as_str()))
            .cloned()
            .collect();
        for record in orphans {
            info!("{} is no longer declared, destroying {} {}", record.name, record.kind, record.handle);
            self.destroy_record(&record).await?;
            summary.destroyed.push(record.name);
        }

        info!("Apply complete: {}", summary);
        Ok(summary)
    }

    /// Destroy every recorded resource, last created first
    pub async fn destroy(&mut self) -> Result<Vec<String>, ControllerError> {
        let records: Vec<ResourceRecord> = self.store.records().iter().rev().cloned().collect();
        let mut destroyed = Vec::with_capacity(records.len());
        for record in records {
            self.destroy_record(&record).await?;
            destroyed.push(record.name);
        }
        info!("Destroy complete: {} resources", destroyed.len());
        Ok(destroyed)
    }

    /// Run every declared lookup, keyed by lookup name
    pub async fn lookup(&self, manifest: &Manifest) -> Result<Map<String, Value>, ControllerError> {
        let mut results = Map::new();
        for declared in &manifest.data {
            let query = declared.query.resolve_references(&declared.name, |name| {
                self.store.get(name).map(|r| r.handle.as_str().to_string())
            })?;
            info!("Looking up {} ({})", declared.name, query.kind());

            let found = match &query {
                LookupQuery::Server(q) => self.reconciler.find_server(q).await.map(to_json),
                LookupQuery::PortForwardingRule(q) => {
                    self.reconciler.find_port_forwarding_rule(q).await.map(to_json)
                }
                LookupQuery::NksCluster(q) => self.reconciler.find_nks_cluster(q).await.map(to_json),
                LookupQuery::NksNodePools(q) => {
                    self.reconciler.nks_node_pool_names(&q.uuid).await.map(to_json)
                }
            };
            let value = found.map_err(|e| ControllerError::reconcile(&declared.name, e))??;
            results.insert(declared.name.clone(), value);
        }
        Ok(results)
    }

    async fn apply_kind<R: Declared>(
        &mut self,
        name: &str,
        spec: ResourceSpec,
    ) -> Result<(Outcome, Handle), ControllerError> {
        let desired = R::spec_of(&spec).cloned().ok_or_else(|| {
            ControllerError::InvalidManifest(format!("{} is not a {}", name, R::KIND))
        })?;

        let Some(record) = self.store.get(name).cloned() else {
            let handle = self.create_recorded::<R>(name, spec, &desired).await?;
            return Ok((Outcome::Created, handle));
        };

        let current = match R::spec_of(&record.spec) {
            Some(current) if record.kind == R::KIND => current.clone(),
            _ => {
                info!("{} changed kind from {} to {}, replacing", name, record.kind, R::KIND);
                self.destroy_record(&record).await?;
                let handle = self.create_recorded::<R>(name, spec, &desired).await?;
                return Ok((Outcome::Replaced, handle));
            }
        };

        let observed = match self.reconciler.read::<R>(&record.handle).await {
            Ok(observed) => observed,
            Err(e) if e.is_not_found() => {
                warn!("{} {} ({}) no longer exists, recreating", R::KIND, record.handle, name);
                self.store.remove(name);
                self.store.save().await?;
                let handle = self.create_recorded::<R>(name, spec, &desired).await?;
                return Ok((Outcome::Replaced, handle));
            }
            Err(e) => return Err(ControllerError::reconcile(name, e)),
        };

        if observed.state == LifecycleState::Failed {
            warn!(
                "{} {} ({}) is in failure status {}, replacing",
                R::KIND,
                record.handle,
                name,
                observed.status
            );
            self.destroy_record(&record).await?;
            let handle = self.create_recorded::<R>(name, spec, &desired).await?;
            return Ok((Outcome::Replaced, handle));
        }

        if current == desired {
            let observed = match observed.state {
                LifecycleState::Submitted | LifecycleState::Pending => self
                    .reconciler
                    .await_ready::<R>(&record.handle)
                    .await
                    .map_err(|e| ControllerError::reconcile(name, e))?,
                _ => observed,
            };
            self.set_status(name, observed.status).await?;
            return Ok((Outcome::Unchanged, record.handle));
        }

        match self.reconciler.update::<R>(&record.handle, &current, &desired).await {
            Ok(observed) => {
                self.store.upsert(ResourceRecord {
                    spec,
                    status: Some(observed.status),
                    ..record.clone()
                });
                self.store.save().await?;
                Ok((Outcome::Updated, record.handle))
            }
            Err(ReconcileError::ImmutableFieldChanged { fields, .. }) => {
                info!(
                    "{} changes creation-only fields ({}), replacing {} {}",
                    name,
                    fields.join(", "),
                    R::KIND,
                    record.handle
                );
                self.destroy_record(&record).await?;
                let handle = self.create_recorded::<R>(name, spec, &desired).await?;
                Ok((Outcome::Replaced, handle))
            }
            Err(e) => Err(ControllerError::reconcile(name, e)),
        }
    }

    /// Create, persist the handle, then wait for ready.
    ///
    /// The record is saved before the wait so a failed or interrupted wait
    /// still leaves something a later destroy can clean up.
    async fn create_recorded<R: Declared>(
        &mut self,
        name: &str,
        spec: ResourceSpec,
        desired: &R::Spec,
    ) -> Result<Handle, ControllerError> {
        let handle = self
            .reconciler
            .create::<R>(desired)
            .await
            .map_err(|e| ControllerError::reconcile(name, e))?;

        self.store.upsert(ResourceRecord {
            name: name.to_string(),
            kind: R::KIND.to_string(),
            handle: handle.clone(),
            spec,
            status: None,
        });
        self.store.save().await?;

        let observed = self
            .reconciler
            .await_ready::<R>(&handle)
            .await
            .map_err(|e| ControllerError::reconcile(name, e))?;
        self.set_status(name, observed.status).await?;
        Ok(handle)
    }

    async fn set_status(&mut self, name: &str, status: String) -> Result<(), ControllerError> {
        if let Some(record) = self.store.get(name) {
            if record.status.as_deref() == Some(status.as_str()) {
                return Ok(());
            }
            let record = ResourceRecord {
                status: Some(status),
                ..record.clone()
            };
            self.store.upsert(record);
            self.store.save().await?;
        }
        Ok(())
    }

    /// Destroy the remote resource and drop its record
    async fn destroy_record(&mut self, record: &ResourceRecord) -> Result<(), ControllerError> {
        for_kind!(record.kind.as_str(), R => self
            .reconciler
            .destroy::<R>(&record.handle)
            .await
            .map_err(|e| ControllerError::reconcile(&record.name, e)))?;

        self.store.remove(&record.name);
        self.store.save().await
    }
}

fn to_json<T: serde::Serialize>(found: T) -> Result<Value, ControllerError> {
    Ok(serde_json::to_value(found)?)
}
