// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterConfiguration ownership ledger.
//!
//! One ClusterConfiguration exists per workload cluster that at least one
//! profile matches. Every matching profile holds an owner reference plus a
//! parallel per-profile block in the status; the last departing owner
//! deletes the record. All mutations are optimistic read-modify-write with
//! conflict retry.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, instrument};

use crate::error::{DroverError, Result};
use crate::kubernetes::retry_on_conflict;
use crate::types::configuration::{
    ClusterConfiguration, ClusterConfigurationStatus, ClusterProfileResource,
};
use crate::types::profile::ClusterProfile;
use crate::types::ClusterRef;

/// Ensure every matching cluster has a ClusterConfiguration that lists this
/// profile as an owner and carries its per-profile status block.
#[instrument(skip(client, profile), fields(profile = %profile.name_any()))]
pub async fn update_cluster_configurations(client: &Client, profile: &ClusterProfile) -> Result<()> {
    for cluster in profile.matching_clusters() {
        create_cluster_configuration(client, &cluster).await?;
        add_profile_owner(client, profile, &cluster).await?;
        add_profile_resource_block(client, profile, &cluster).await?;
    }
    Ok(())
}

/// Create the ClusterConfiguration for a cluster; already-exists is success.
async fn create_cluster_configuration(client: &Client, cluster: &ClusterRef) -> Result<()> {
    let api: Api<ClusterConfiguration> = Api::namespaced(client.clone(), &cluster.namespace);
    let configuration = ClusterConfiguration {
        metadata: ObjectMeta {
            name: Some(cluster.name.clone()),
            namespace: Some(cluster.namespace.clone()),
            ..Default::default()
        },
        spec: Default::default(),
        status: None,
    };

    match api.create(&PostParams::default(), &configuration).await {
        Ok(_) => {
            info!(cluster = %cluster, "Created ClusterConfiguration");
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

fn same_owner(a: &OwnerReference, b: &OwnerReference) -> bool {
    a.kind == b.kind && a.name == b.name && a.uid == b.uid
}

/// Add the profile to the configuration's owner references; no-op if present.
async fn add_profile_owner(client: &Client, profile: &ClusterProfile, cluster: &ClusterRef) -> Result<()> {
    let api: Api<ClusterConfiguration> = Api::namespaced(client.clone(), &cluster.namespace);
    let owner = profile.owner_reference()?;
    let name = cluster.name.clone();

    retry_on_conflict(|| {
        let api = api.clone();
        let owner = owner.clone();
        let name = name.clone();
        async move {
            let mut current = api.get(&name).await.map_err(DroverError::from)?;
            if current.owner_references().iter().any(|r| same_owner(r, &owner)) {
                return Ok(());
            }
            current
                .metadata
                .owner_references
                .get_or_insert_with(Vec::new)
                .push(owner);
            api.replace(&name, &PostParams::default(), &current)
                .await
                .map_err(DroverError::from)?;
            Ok(())
        }
    })
    .await
}

/// Ensure the per-profile block exists in the configuration status.
async fn add_profile_resource_block(
    client: &Client,
    profile: &ClusterProfile,
    cluster: &ClusterRef,
) -> Result<()> {
    let api: Api<ClusterConfiguration> = Api::namespaced(client.clone(), &cluster.namespace);
    let profile_name = profile.name_any();
    let name = cluster.name.clone();

    retry_on_conflict(|| {
        let api = api.clone();
        let profile_name = profile_name.clone();
        let name = name.clone();
        async move {
            let mut current = api.get(&name).await.map_err(DroverError::from)?;
            let status = current.status.get_or_insert_with(Default::default);
            if status
                .cluster_profile_resources
                .iter()
                .any(|r| r.cluster_profile_name == profile_name)
            {
                return Ok(());
            }
            status.cluster_profile_resources.push(ClusterProfileResource {
                cluster_profile_name: profile_name,
                features: Vec::new(),
            });
            api.replace_status(&name, &PostParams::default(), serde_json::to_vec(&current)?)
                .await
                .map_err(DroverError::from)?;
            Ok(())
        }
    })
    .await
}

/// Detach this profile from every ClusterConfiguration whose cluster is no
/// longer in the match set. The last departing owner deletes the record.
#[instrument(skip(client, profile), fields(profile = %profile.name_any()))]
pub async fn clean_cluster_configurations(client: &Client, profile: &ClusterProfile) -> Result<()> {
    let matching: std::collections::BTreeSet<ClusterRef> =
        profile.matching_clusters().into_iter().collect();

    let api: Api<ClusterConfiguration> = Api::all(client.clone());
    let configurations = api.list(&ListParams::default()).await?;

    for configuration in &configurations.items {
        let cluster = ClusterRef::new(
            &configuration.namespace().unwrap_or_default(),
            &configuration.name_any(),
        );
        if matching.contains(&cluster) {
            continue;
        }
        if !configuration.is_owned_by(profile) {
            continue;
        }

        remove_profile_owner(client, profile, &cluster).await?;
        remove_profile_resource_block(client, profile, &cluster).await?;
    }

    Ok(())
}

/// Remove the profile from the configuration's owner references; delete the
/// configuration entirely when it was the last owner.
async fn remove_profile_owner(client: &Client, profile: &ClusterProfile, cluster: &ClusterRef) -> Result<()> {
    let api: Api<ClusterConfiguration> = Api::namespaced(client.clone(), &cluster.namespace);
    let owner = profile.owner_reference()?;
    let name = cluster.name.clone();

    let result = retry_on_conflict(|| {
        let api = api.clone();
        let owner = owner.clone();
        let name = name.clone();
        async move {
            let mut current = api.get(&name).await.map_err(DroverError::from)?;
            let owners: Vec<OwnerReference> = current
                .owner_references()
                .iter()
                .filter(|r| !same_owner(r, &owner))
                .cloned()
                .collect();
            if owners.len() == current.owner_references().len() {
                return Ok(());
            }

            if owners.is_empty() {
                info!(cluster = %name, "Last owner departed, deleting ClusterConfiguration");
                api.delete(&name, &DeleteParams::default())
                    .await
                    .map_err(DroverError::from)?;
            } else {
                current.metadata.owner_references = Some(owners);
                api.replace(&name, &PostParams::default(), &current)
                    .await
                    .map_err(DroverError::from)?;
            }
            Ok(())
        }
    })
    .await;

    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// Drop the named block from the status slice. Order within the slice is
/// immaterial, so the target is swapped with the last element instead of
/// shifting the tail. Returns whether anything was removed.
fn remove_resource_block(status: &mut ClusterConfigurationStatus, profile_name: &str) -> bool {
    let Some(position) = status
        .cluster_profile_resources
        .iter()
        .position(|r| r.cluster_profile_name == profile_name)
    else {
        return false;
    };
    status.cluster_profile_resources.swap_remove(position);
    true
}

/// Drop the per-profile block from the configuration status
async fn remove_profile_resource_block(
    client: &Client,
    profile: &ClusterProfile,
    cluster: &ClusterRef,
) -> Result<()> {
    let api: Api<ClusterConfiguration> = Api::namespaced(client.clone(), &cluster.namespace);
    let profile_name = profile.name_any();
    let name = cluster.name.clone();

    let result = retry_on_conflict(|| {
        let api = api.clone();
        let profile_name = profile_name.clone();
        let name = name.clone();
        async move {
            let mut current = api.get(&name).await.map_err(DroverError::from)?;
            let Some(status) = current.status.as_mut() else {
                return Ok(());
            };
            if !remove_resource_block(status, &profile_name) {
                return Ok(());
            }

            debug!(cluster = %name, profile = %profile_name, "Removed profile resource block");
            api.replace_status(&name, &PostParams::default(), serde_json::to_vec(&current)?)
                .await
                .map_err(DroverError::from)?;
            Ok(())
        }
    })
    .await;

    // Gone entirely means the profile was the last owner and the record was
    // already deleted.
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}
