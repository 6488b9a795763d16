// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch mappers: given a changed Cluster or Machine, return the
//! ClusterProfiles to re-enqueue. Pure in-memory; the only state consulted
//! is the [`crate::index::ProfileIndex`]. Cosmetic events are dropped
//! upstream by the [`crate::predicates`] filters.

use std::collections::BTreeMap;

use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;
use tracing::debug;

use crate::index::SharedIndex;
use crate::types::cluster::Cluster;
use crate::types::machine::Machine;
use crate::types::profile::ClusterProfile;
use crate::types::ClusterRef;

/// Profiles affected by a workload cluster event: those that matched the
/// cluster at their last reconcile plus those whose selector matches its
/// current labels.
pub fn profiles_for_cluster(index: &SharedIndex, cluster: &Cluster) -> Vec<ObjectRef<ClusterProfile>> {
    let cluster_ref = cluster.cluster_ref();
    let empty = BTreeMap::new();
    let labels = cluster.metadata.labels.as_ref().unwrap_or(&empty);

    let profiles = index
        .lock()
        .expect("profile index poisoned")
        .lookup(&cluster_ref, labels);

    debug!(
        cluster = %cluster_ref,
        count = profiles.len(),
        "Mapped cluster event to profiles"
    );

    profiles
        .into_iter()
        .map(|name| ObjectRef::new(&name))
        .collect()
}

/// Profiles affected by a machine event. Only control-plane machines are
/// relevant: their phase drives the cluster readiness gate. The machine is
/// mapped to its owning cluster and the index answers which profiles
/// currently match that cluster.
pub fn profiles_for_machine(index: &SharedIndex, machine: &Machine) -> Vec<ObjectRef<ClusterProfile>> {
    if !machine.is_control_plane() {
        return Vec::new();
    }

    let Some(cluster_name) = machine.cluster_name() else {
        debug!(machine = %machine.name_any(), "Machine has no owning cluster, ignoring");
        return Vec::new();
    };
    let cluster_ref = ClusterRef::new(&machine.namespace().unwrap_or_default(), &cluster_name);

    let profiles = index
        .lock()
        .expect("profile index poisoned")
        .profiles_matching_cluster(&cluster_ref);

    debug!(
        cluster = %cluster_ref,
        count = profiles.len(),
        "Mapped machine event to profiles"
    );

    profiles
        .into_iter()
        .map(|name| ObjectRef::new(&name))
        .collect()
}
