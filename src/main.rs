// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};

use drover::config::Config;
use drover::index::ProfileIndex;
use drover::kubernetes::wait_for_cluster_api_crd;
use drover::reconcilers::ProfileReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Drover operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: concurrent_reconciles={}",
        config.concurrent_reconciles
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Wait for the Cluster API CRDs before starting the reconciler
    info!("Waiting for Cluster API CRDs to become available...");
    wait_for_cluster_api_crd(&client).await?;

    // The profile <-> cluster index shared between the reconciler and the
    // watch mappers
    let index = ProfileIndex::shared();

    let reconciler = ProfileReconciler::new(client, config, index);

    info!("Starting ClusterProfile reconciler...");
    reconciler.run().await?;

    // This should never be reached as the reconciler runs until shutdown
    warn!("Reconciler stopped unexpectedly");
    Ok(())
}
