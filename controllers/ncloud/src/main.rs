//! NCloud Controller
//!
//! Reconciles declared NCloud resources against the vendor API:
//! - Server: classic and VPC server instances, including spec changes
//! - Vpc, Subnet, NatGateway: VPC networking
//! - NksCluster: managed Kubernetes clusters
//!
//! Resources are declared in a YAML manifest. Handles of created resources
//! are kept in a local state file so later runs update, replace or destroy
//! the same remote resources. Lookups declared under `data` (servers,
//! port-forwarding rules, NKS clusters and node pools) are printed as JSON by
//! `NCLOUD_ACTION=lookup`.

mod backoff;
mod config;
mod controller;
mod error;
mod lifecycle;
mod lookup;
mod manifest;
mod poll;
mod reconciler;
mod store;
mod test_utils;

mod poll_test;

use anyhow::{Context, Result};
use config::{Action, ProviderConfig, RunSettings};
use controller::Controller;
use manifest::Manifest;
use ncloud_client::NcloudClient;
use reconciler::Reconciler;
use std::sync::Arc;
use store::StateStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting NCloud Controller");

    let provider = ProviderConfig::from_env().context("loading provider configuration")?;
    let run = RunSettings::from_env().context("loading run settings")?;

    info!("Configuration:");
    info!("  Region: {} ({:?} site)", provider.region, provider.site);
    info!("  Mode: {}", provider.mode());
    info!("  Manifest: {}", run.manifest_path.display());
    info!("  State file: {}", run.state_path.display());

    let client = NcloudClient::new(
        provider.endpoints.clone(),
        provider.credentials.clone(),
        provider.region.clone(),
    )
    .context("building NCloud client")?;

    // Ctrl-C aborts the current wait; remote resources are left as they are
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight waits");
            on_signal.cancel();
        }
    });

    let reconciler = Reconciler::new(Arc::new(client), &provider).with_cancellation(cancel);
    let store = StateStore::load(run.state_path.clone())
        .await
        .with_context(|| format!("loading state from {}", run.state_path.display()))?;
    let mut controller = Controller::new(reconciler, store);

    match run.action {
        Action::Apply => {
            let manifest = Manifest::load(&run.manifest_path)
                .await
                .with_context(|| format!("loading manifest {}", run.manifest_path.display()))?;
            info!("Applying {} declared resources", manifest.resources.len());
            let summary = controller.apply(&manifest).await?;
            info!("{}", summary);
        }
        Action::Destroy => {
            let destroyed = controller.destroy().await?;
            info!("Destroyed: {}", destroyed.join(", "));
        }
        Action::Lookup => {
            let manifest = Manifest::load(&run.manifest_path)
                .await
                .with_context(|| format!("loading manifest {}", run.manifest_path.display()))?;
            info!("Running {} declared lookups", manifest.data.len());
            let results = controller.lookup(&manifest).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
