// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterProfile reconciler - converges the derived per-cluster objects
//! (ClusterConfiguration, ClusterReport, ClusterSummary) on the profile's
//! declared intent, and tears them down when the profile is deleted.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::api::{Patch, PatchParams};
use kube::{
    runtime::{controller, controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::{CLUSTER_PROFILE_FINALIZER, OPERATOR_NAME};
use crate::error::{DroverError, Result};
use crate::fanout::{configurations, reports, summaries};
use crate::index::SharedIndex;
use crate::kubernetes::{add_finalizer, remove_finalizer};
use crate::mappers::{profiles_for_cluster, profiles_for_machine};
use crate::matching::get_matching_clusters;
use crate::predicates::{ClusterPredicate, MachinePredicate};
use crate::types::cluster::Cluster;
use crate::types::machine::Machine;
use crate::types::profile::{ClusterProfile, ClusterProfileStatus, MatchingClusterRef};
use crate::types::ClusterRef;

pub struct ProfileReconciler {
    client: Client,
    config: Config,
    index: SharedIndex,
}

impl ProfileReconciler {
    pub fn new(client: Client, config: Config, index: SharedIndex) -> Self {
        Self {
            client,
            config,
            index,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let profiles: Api<ClusterProfile> = Api::all(self.client.clone());
        let clusters: Api<Cluster> = Api::all(self.client.clone());
        let machines: Api<Machine> = Api::all(self.client.clone());

        let cluster_index = self.index.clone();
        let machine_index = self.index.clone();
        let cluster_predicate = ClusterPredicate::default();
        let machine_predicate = MachinePredicate::default();
        let concurrency = self.config.concurrent_reconciles;
        let context = Arc::new(self);

        Controller::new(profiles, watcher::Config::default())
            .watches(clusters, watcher::Config::default(), move |cluster| {
                if !cluster_predicate.observe(&cluster) {
                    return Vec::new();
                }
                profiles_for_cluster(&cluster_index, &cluster)
            })
            .watches(machines, watcher::Config::default(), move |machine| {
                if !machine_predicate.observe(&machine) {
                    return Vec::new();
                }
                profiles_for_machine(&machine_index, &machine)
            })
            .with_config(controller::Config::default().concurrency(concurrency))
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled profile: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(profile: Arc<ClusterProfile>, ctx: Arc<ProfileReconciler>) -> Result<Action> {
    let name = profile.name_any();

    if profile.is_deleting() {
        info!(profile = %name, "Reconciling profile delete");
        reconcile_delete(&profile, &ctx).await
    } else {
        debug!(profile = %name, "Reconciling profile");
        reconcile_normal(&profile, &ctx).await
    }
}

/// Normal path: match clusters, persist the match set, refresh the index,
/// then fan derived objects out and prune the stale ones.
async fn reconcile_normal(profile: &ClusterProfile, ctx: &ProfileReconciler) -> Result<Action> {
    let name = profile.name_any();

    // Register the finalizer before creating anything, so a later delete is
    // guaranteed to drain.
    add_finalizer(&ctx.client, profile, CLUSTER_PROFILE_FINALIZER).await?;

    let matches = get_matching_clusters(&ctx.client, &profile.spec.cluster_selector).await?;
    let profile = with_matching_clusters(profile, &matches);
    write_matching_clusters(&ctx.client, &name, &matches).await?;

    {
        let match_set: BTreeSet<ClusterRef> = matches.iter().cloned().collect();
        ctx.index
            .lock()
            .expect("profile index poisoned")
            .refresh(&name, &profile.spec.cluster_selector, &match_set);
    }

    configurations::update_cluster_configurations(&ctx.client, &profile).await?;
    reports::update_cluster_reports(&ctx.client, &profile).await?;
    summaries::update_cluster_summaries(&ctx.client, &profile).await?;

    summaries::clean_cluster_summaries(&ctx.client, &profile).await?;
    configurations::clean_cluster_configurations(&ctx.client, &profile).await?;

    debug!(profile = %name, matches = matches.len(), "Reconcile success");
    Ok(Action::await_change())
}

/// Delete path: drain summaries first (the deployment agents hold their own
/// finalizers on them), then detach the ledger, then release the finalizer.
async fn reconcile_delete(profile: &ClusterProfile, ctx: &ProfileReconciler) -> Result<Action> {
    let name = profile.name_any();

    // An empty match set makes every derived object stale for the cleaners.
    let profile = with_matching_clusters(profile, &[]);
    write_matching_clusters(&ctx.client, &name, &[]).await?;
    {
        let empty = BTreeSet::new();
        ctx.index
            .lock()
            .expect("profile index poisoned")
            .refresh(&name, &profile.spec.cluster_selector, &empty);
    }

    summaries::clean_cluster_summaries(&ctx.client, &profile).await?;

    if !summaries::all_cluster_summaries_gone(&ctx.client, &name).await {
        info!(profile = %name, "Not all cluster summaries are gone");
        return Ok(Action::requeue(ctx.config.delete_requeue_after));
    }

    configurations::clean_cluster_configurations(&ctx.client, &profile).await?;
    reports::clean_cluster_reports(&ctx.client, &name).await?;

    // The drain check is rerun right before the finalizer goes: a summary
    // recreated in between must keep the profile alive.
    if !summaries::all_cluster_summaries_gone(&ctx.client, &name).await {
        info!(profile = %name, "Cannot remove finalizer yet");
        return Ok(Action::requeue(ctx.config.delete_requeue_after));
    }

    remove_finalizer(&ctx.client, &profile, CLUSTER_PROFILE_FINALIZER).await?;
    ctx.index
        .lock()
        .expect("profile index poisoned")
        .remove(&name);

    info!(profile = %name, "Reconcile delete success");
    Ok(Action::await_change())
}

fn error_policy(profile: Arc<ClusterProfile>, error: &DroverError, _ctx: Arc<ProfileReconciler>) -> Action {
    error!(profile = %profile.name_any(), "Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}

/// Local copy of the profile with the given match set in status, so the
/// fan-out helpers observe the set just computed instead of the stale one.
fn with_matching_clusters(profile: &ClusterProfile, matches: &[ClusterRef]) -> ClusterProfile {
    let mut profile = profile.clone();
    profile.status = Some(ClusterProfileStatus {
        matching_cluster_refs: matches.iter().map(MatchingClusterRef::from).collect(),
    });
    profile
}

/// Persist the match set on the profile status. The refs are written
/// explicitly (an empty list must overwrite, not be skipped).
async fn write_matching_clusters(client: &Client, name: &str, matches: &[ClusterRef]) -> Result<()> {
    let refs: Vec<MatchingClusterRef> = matches.iter().map(MatchingClusterRef::from).collect();
    let patch = json!({ "status": { "matchingClusterRefs": refs } });

    let profiles: Api<ClusterProfile> = Api::all(client.clone());
    let params = PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    };
    profiles
        .patch_status(name, &params, &Patch::Merge(&patch))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{ClusterProfileSpec, SyncMode};
    use kube::api::ObjectMeta;

    fn make_profile(name: &str) -> ClusterProfile {
        ClusterProfile {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                uid: Some("test-uid".to_string()),
                ..Default::default()
            },
            spec: ClusterProfileSpec {
                cluster_selector: "env=prod".to_string(),
                sync_mode: SyncMode::Continuous,
                helm_charts: Vec::new(),
                policy_refs: Vec::new(),
            },
            status: None,
        }
    }

    #[test]
    fn test_with_matching_clusters_overrides_status() {
        let profile = make_profile("p1");
        let matches = vec![ClusterRef::new("a", "c1"), ClusterRef::new("a", "c2")];

        let updated = with_matching_clusters(&profile, &matches);
        assert_eq!(updated.matching_clusters(), matches);

        // And an empty set really clears it
        let cleared = with_matching_clusters(&updated, &[]);
        assert!(cleared.matching_clusters().is_empty());
    }

    #[test]
    fn test_matching_refs_carry_cluster_kind() {
        let updated = with_matching_clusters(&make_profile("p1"), &[ClusterRef::new("a", "c1")]);
        let refs = &updated.status.unwrap().matching_cluster_refs;
        assert_eq!(refs[0].kind, "Cluster");
        assert_eq!(refs[0].namespace, "a");
        assert_eq!(refs[0].name, "c1");
    }
}
