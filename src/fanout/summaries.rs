// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterSummary lifecycle: one summary per (profile, ready cluster) pair,
//! carrying the profile's feature payload for the deployment agents.

use kube::api::{DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::constants::labels;
use crate::error::{DroverError, Result};
use crate::readiness::is_cluster_ready_to_be_configured;
use crate::types::profile::ClusterProfile;
use crate::types::summary::{ClusterSummary, ClusterSummarySpec};
use crate::types::ClusterRef;

/// Ensure a summary exists (and tracks the profile, unless frozen) for every
/// matching cluster that is ready to be configured. Clusters that are not
/// ready yet are skipped; the machine watch re-enqueues the profile once a
/// control plane comes up.
#[instrument(skip(client, profile), fields(profile = %profile.name_any()))]
pub async fn update_cluster_summaries(client: &Client, profile: &ClusterProfile) -> Result<()> {
    for cluster in profile.matching_clusters() {
        if !is_cluster_ready_to_be_configured(client, &cluster).await? {
            debug!(cluster = %cluster, "Cluster is not ready yet");
            continue;
        }

        match get_cluster_summary(client, profile, &cluster).await? {
            None => {
                // A failed create only affects this cluster; the others in
                // the match set still get their summary this run.
                if let Err(e) = create_cluster_summary(client, profile, &cluster).await {
                    tracing::error!(cluster = %cluster, "Failed to create ClusterSummary: {}", e);
                }
            }
            Some(existing) => update_cluster_summary(client, profile, &cluster, existing).await?,
        }
    }
    Ok(())
}

/// Fetch the summary for a (profile, cluster) pair; None if it doesn't exist
async fn get_cluster_summary(
    client: &Client,
    profile: &ClusterProfile,
    cluster: &ClusterRef,
) -> Result<Option<ClusterSummary>> {
    let api: Api<ClusterSummary> = Api::namespaced(client.clone(), &cluster.namespace);
    match api
        .get(&ClusterSummary::name_for(&profile.name_any(), &cluster.name))
        .await
    {
        Ok(summary) => Ok(Some(summary)),
        Err(e) => {
            let e = DroverError::from(e);
            if e.is_not_found() {
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

async fn create_cluster_summary(
    client: &Client,
    profile: &ClusterProfile,
    cluster: &ClusterRef,
) -> Result<()> {
    let profile_name = profile.name_any();
    let summary = ClusterSummary {
        metadata: ObjectMeta {
            name: Some(ClusterSummary::name_for(&profile_name, &cluster.name)),
            namespace: Some(cluster.namespace.clone()),
            owner_references: Some(vec![profile.owner_reference()?]),
            labels: Some(BTreeMap::from([
                (labels::CLUSTER_PROFILE.to_string(), profile_name.clone()),
                (labels::CLUSTER_NAMESPACE.to_string(), cluster.namespace.clone()),
                (labels::CLUSTER_NAME.to_string(), cluster.name.clone()),
            ])),
            // Copy annotations: a paused marker on the profile must reach
            // the deployment agents.
            annotations: profile.metadata.annotations.clone(),
            ..Default::default()
        },
        spec: ClusterSummarySpec {
            cluster_namespace: cluster.namespace.clone(),
            cluster_name: cluster.name.clone(),
            cluster_profile_spec: profile.spec.clone(),
        },
        status: None,
    };

    let api: Api<ClusterSummary> = Api::namespaced(client.clone(), &cluster.namespace);
    match api.create(&PostParams::default(), &summary).await {
        Ok(_) => {
            info!(cluster = %cluster, "Created ClusterSummary");
            Ok(())
        }
        Err(e) => {
            let e = DroverError::from(e);
            if e.is_already_exists() {
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

/// Re-align an existing summary with the profile. OneTime mode freezes the
/// summary after its first write, so nothing happens there.
async fn update_cluster_summary(
    client: &Client,
    profile: &ClusterProfile,
    cluster: &ClusterRef,
    mut summary: ClusterSummary,
) -> Result<()> {
    if profile.is_one_time() {
        return Ok(());
    }

    if summary.spec.cluster_profile_spec == profile.spec
        && summary.metadata.annotations == profile.metadata.annotations
    {
        // Nothing has changed
        return Ok(());
    }

    summary.metadata.annotations = profile.metadata.annotations.clone();
    summary.spec.cluster_profile_spec = profile.spec.clone();

    let api: Api<ClusterSummary> = Api::namespaced(client.clone(), &cluster.namespace);
    api.replace(&summary.name_any(), &PostParams::default(), &summary)
        .await?;
    info!(cluster = %cluster, "Updated ClusterSummary");
    Ok(())
}

/// Prune summaries for clusters that dropped out of the match set, and keep
/// the embedded sync mode of the retained ones aligned with the profile.
/// With the match set cleared (profile deletion) this removes every summary.
#[instrument(skip(client, profile), fields(profile = %profile.name_any()))]
pub async fn clean_cluster_summaries(client: &Client, profile: &ClusterProfile) -> Result<()> {
    let matching: std::collections::BTreeSet<ClusterRef> =
        profile.matching_clusters().into_iter().collect();

    for summary in list_profile_summaries(client, &profile.name_any()).await? {
        if !summary.is_owned_by(profile) {
            continue;
        }

        let cluster = ClusterRef::new(&summary.spec.cluster_namespace, &summary.spec.cluster_name);
        if !matching.contains(&cluster) {
            delete_cluster_summary(client, &summary).await?;
        } else {
            align_sync_mode(client, profile, summary).await?;
        }
    }

    Ok(())
}

async fn delete_cluster_summary(client: &Client, summary: &ClusterSummary) -> Result<()> {
    let namespace = summary.namespace().unwrap_or_default();
    let api: Api<ClusterSummary> = Api::namespaced(client.clone(), &namespace);
    match api.delete(&summary.name_any(), &DeleteParams::default()).await {
        Ok(_) => {
            info!(summary = %summary.name_any(), "Deleted ClusterSummary");
            Ok(())
        }
        Err(e) => {
            let e = DroverError::from(e);
            if e.is_not_found() {
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

/// The summary mirrors the profile's current sync mode even in OneTime mode
/// (the freeze covers the payload, not the mode itself).
async fn align_sync_mode(client: &Client, profile: &ClusterProfile, summary: ClusterSummary) -> Result<()> {
    if summary.spec.cluster_profile_spec.sync_mode == profile.spec.sync_mode {
        return Ok(());
    }

    let namespace = summary.namespace().unwrap_or_default();
    let api: Api<ClusterSummary> = Api::namespaced(client.clone(), &namespace);
    let mut current = api.get(&summary.name_any()).await?;
    current.spec.cluster_profile_spec.sync_mode = profile.spec.sync_mode;
    api.replace(&current.name_any(), &PostParams::default(), &current)
        .await?;
    debug!(summary = %summary.name_any(), "Aligned ClusterSummary sync mode");
    Ok(())
}

/// All summaries labeled with this profile, match or not
async fn list_profile_summaries(client: &Client, profile_name: &str) -> Result<Vec<ClusterSummary>> {
    let api: Api<ClusterSummary> = Api::all(client.clone());
    let params =
        ListParams::default().labels(&format!("{}={}", labels::CLUSTER_PROFILE, profile_name));
    Ok(api.list(&params).await?.items)
}

/// True once no summary labeled with this profile remains. Listing errors
/// count as "not gone": the drain must never complete on uncertain state.
pub async fn all_cluster_summaries_gone(client: &Client, profile_name: &str) -> bool {
    match list_profile_summaries(client, profile_name).await {
        Ok(summaries) => summaries.is_empty(),
        Err(e) => {
            tracing::warn!(profile = profile_name, "Failed to list ClusterSummaries: {}", e);
            false
        }
    }
}
