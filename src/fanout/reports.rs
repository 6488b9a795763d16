// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterReport lifecycle: one report per matching cluster while the
//! profile is in DryRun mode, none otherwise.

use kube::api::{DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::constants::labels;
use crate::error::{DroverError, Result};
use crate::types::profile::ClusterProfile;
use crate::types::report::{ClusterReport, ClusterReportSpec};
use crate::types::ClusterRef;

/// DryRun profiles get a report per matching cluster (reports for clusters
/// that dropped out of the match set are pruned); any other mode clears
/// every report the profile created.
#[instrument(skip(client, profile), fields(profile = %profile.name_any()))]
pub async fn update_cluster_reports(client: &Client, profile: &ClusterProfile) -> Result<()> {
    if profile.is_dry_run() {
        for cluster in profile.matching_clusters() {
            create_cluster_report(client, profile, &cluster).await?;
        }
        clean_stale_cluster_reports(client, profile).await
    } else {
        clean_cluster_reports(client, &profile.name_any()).await
    }
}

/// Create the report for a cluster; already-exists is success
async fn create_cluster_report(client: &Client, profile: &ClusterProfile, cluster: &ClusterRef) -> Result<()> {
    let profile_name = profile.name_any();
    let report = ClusterReport {
        metadata: ObjectMeta {
            name: Some(ClusterReport::name_for(&profile_name, &cluster.name)),
            namespace: Some(cluster.namespace.clone()),
            labels: Some(BTreeMap::from([(
                labels::CLUSTER_PROFILE.to_string(),
                profile_name,
            )])),
            ..Default::default()
        },
        spec: ClusterReportSpec {
            cluster_namespace: cluster.namespace.clone(),
            cluster_name: cluster.name.clone(),
        },
        status: None,
    };

    let api: Api<ClusterReport> = Api::namespaced(client.clone(), &cluster.namespace);
    match api.create(&PostParams::default(), &report).await {
        Ok(_) => {
            info!(cluster = %cluster, "Created ClusterReport");
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

/// Delete reports for clusters no longer in the match set, keeping the rest
async fn clean_stale_cluster_reports(client: &Client, profile: &ClusterProfile) -> Result<()> {
    let matching: std::collections::BTreeSet<ClusterRef> =
        profile.matching_clusters().into_iter().collect();

    for report in list_profile_reports(client, &profile.name_any()).await? {
        let cluster = ClusterRef::new(&report.spec.cluster_namespace, &report.spec.cluster_name);
        if !matching.contains(&cluster) {
            delete_cluster_report(client, &report).await?;
        }
    }

    Ok(())
}

/// Delete every report labeled with this profile, ignoring already-gone ones
#[instrument(skip(client))]
pub async fn clean_cluster_reports(client: &Client, profile_name: &str) -> Result<()> {
    for report in list_profile_reports(client, profile_name).await? {
        delete_cluster_report(client, &report).await?;
    }
    Ok(())
}

async fn list_profile_reports(client: &Client, profile_name: &str) -> Result<Vec<ClusterReport>> {
    let api: Api<ClusterReport> = Api::all(client.clone());
    let params =
        ListParams::default().labels(&format!("{}={}", labels::CLUSTER_PROFILE, profile_name));
    Ok(api.list(&params).await?.items)
}

async fn delete_cluster_report(client: &Client, report: &ClusterReport) -> Result<()> {
    let namespace = report.namespace().unwrap_or_default();
    let api: Api<ClusterReport> = Api::namespaced(client.clone(), &namespace);
    match api.delete(&report.name_any(), &DeleteParams::default()).await {
        Ok(_) => {
            info!(report = %report.name_any(), "Deleted ClusterReport");
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
