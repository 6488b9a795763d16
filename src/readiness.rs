// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Readiness gate: a workload cluster can be configured once at least one
//! control-plane machine reports the Running phase.

use kube::{api::ListParams, Api, Client};
use tracing::{debug, instrument};

use crate::constants::capi;
use crate::error::Result;
use crate::types::machine::{Machine, MachinePhase};
use crate::types::ClusterRef;

/// List the cluster's machines and check for a running control-plane node.
/// Clusters that are not ready keep their ClusterConfiguration ownership and
/// reports; only ClusterSummary creation waits for readiness.
#[instrument(skip(client), fields(cluster = %cluster))]
pub async fn is_cluster_ready_to_be_configured(client: &Client, cluster: &ClusterRef) -> Result<bool> {
    let machines: Api<Machine> = Api::namespaced(client.clone(), &cluster.namespace);
    let params =
        ListParams::default().labels(&format!("{}={}", capi::CLUSTER_NAME_LABEL, cluster.name));
    let machine_list = machines.list(&params).await?;

    debug!("Found {} machines", machine_list.items.len());

    Ok(machine_list
        .items
        .iter()
        .any(|m| m.is_control_plane() && m.phase() == MachinePhase::Running))
}
