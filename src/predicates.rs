// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event predicates: drop cosmetic watch events before they reach the
//! mappers. A cluster event is relevant when its labels or terminating
//! state changed; a machine event when its phase changed. A watch event
//! only carries the new object, so the previously observed state is cached
//! in memory for the comparison.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use kube::ResourceExt;

use crate::types::cluster::Cluster;
use crate::types::machine::{Machine, MachinePhase};
use crate::types::ClusterRef;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClusterState {
    labels: BTreeMap<String, String>,
    deleting: bool,
}

/// Label-change filter for cluster events
#[derive(Debug, Default)]
pub struct ClusterPredicate {
    seen: Mutex<HashMap<ClusterRef, ClusterState>>,
}

impl ClusterPredicate {
    /// Record the observed state and report whether the event is worth
    /// mapping: first sighting, a label change, or a terminating-state
    /// change. A cluster mid-teardown always passes, so every event of the
    /// deletion flow reaches the mappers.
    pub fn observe(&self, cluster: &Cluster) -> bool {
        let state = ClusterState {
            labels: cluster.metadata.labels.clone().unwrap_or_default(),
            deleting: cluster.is_deleting(),
        };

        let mut seen = self.seen.lock().expect("cluster predicate poisoned");
        match seen.insert(cluster.cluster_ref(), state.clone()) {
            None => true,
            Some(previous) => state.deleting || previous != state,
        }
    }
}

/// Phase-change filter for machine events
#[derive(Debug, Default)]
pub struct MachinePredicate {
    seen: Mutex<HashMap<(String, String), MachinePhase>>,
}

impl MachinePredicate {
    /// Record the observed phase and report whether it changed (first
    /// sightings count as a change)
    pub fn observe(&self, machine: &Machine) -> bool {
        let key = (machine.namespace().unwrap_or_default(), machine.name_any());
        let phase = machine.phase();

        let mut seen = self.seen.lock().expect("machine predicate poisoned");
        seen.insert(key, phase) != Some(phase)
    }
}
