// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bidirectional profile ↔ cluster index.
//!
//! ClusterProfiles match workload clusters by label, so a label change on
//! one cluster must re-enqueue exactly the profiles whose match set it
//! affects. The watch mappers are not allowed to perform I/O (a failed list
//! there would lose the re-enqueue with no retry path), so the reconcile
//! loop records its match results here and the mappers answer from memory.
//!
//! Two inverse maps are kept: refreshing a profile needs the previous match
//! set to know which cluster entries to drop, and mapping a cluster event
//! needs the profiles that matched it last. Selectors are kept alongside so
//! a cluster that newly satisfies a profile still triggers it, even before
//! that profile's next reconcile records the match in the maps.
//!
//! All mutations happen from reconcile tasks, all reads from the mappers; a
//! single mutex serializes both sides and nothing blocks while holding it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::matching::Selector;
use crate::types::ClusterRef;

#[derive(Debug, Clone)]
struct SelectorEntry {
    raw: String,
    /// None when the raw selector failed to parse; such a profile matches nothing
    parsed: Option<Selector>,
}

#[derive(Debug, Default)]
pub struct ProfileIndex {
    /// Workload cluster -> profiles that matched it at their last reconcile
    cluster_to_profiles: HashMap<ClusterRef, BTreeSet<String>>,
    /// Profile -> its last-known match set
    profile_to_clusters: HashMap<String, BTreeSet<ClusterRef>>,
    /// Profile -> its selector, for re-evaluation against changed clusters
    profile_selectors: HashMap<String, SelectorEntry>,
}

/// The index as shared between the reconciler and the watch mappers
pub type SharedIndex = Arc<Mutex<ProfileIndex>>;

impl ProfileIndex {
    pub fn shared() -> SharedIndex {
        Arc::new(Mutex::new(ProfileIndex::default()))
    }

    /// Record the outcome of a profile reconcile: replace the profile's match
    /// set and fix up the inverse map for clusters that dropped out.
    pub fn refresh(&mut self, profile: &str, selector: &str, matches: &BTreeSet<ClusterRef>) {
        let previous = self.profile_to_clusters.remove(profile).unwrap_or_default();

        for dropped in previous.difference(matches) {
            if let Some(profiles) = self.cluster_to_profiles.get_mut(dropped) {
                profiles.remove(profile);
                if profiles.is_empty() {
                    self.cluster_to_profiles.remove(dropped);
                }
            }
        }

        for cluster in matches {
            self.cluster_to_profiles
                .entry(cluster.clone())
                .or_default()
                .insert(profile.to_string());
        }

        self.profile_to_clusters
            .insert(profile.to_string(), matches.clone());

        let parsed = match Selector::parse(selector) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(profile, "Selector not indexed: {}", e);
                None
            }
        };
        self.profile_selectors.insert(
            profile.to_string(),
            SelectorEntry {
                raw: selector.to_string(),
                parsed,
            },
        );
    }

    /// Forget a profile entirely. Called once its finalizer is released.
    pub fn remove(&mut self, profile: &str) {
        if let Some(previous) = self.profile_to_clusters.remove(profile) {
            for cluster in &previous {
                if let Some(profiles) = self.cluster_to_profiles.get_mut(cluster) {
                    profiles.remove(profile);
                    if profiles.is_empty() {
                        self.cluster_to_profiles.remove(cluster);
                    }
                }
            }
        }
        self.profile_selectors.remove(profile);
    }

    /// Profiles to re-enqueue for a cluster event: the profiles that matched
    /// this cluster last, plus every profile whose selector matches its
    /// current labels. The union covers both "no longer matches" (index
    /// side) and "newly matches" (selector side, not yet in the index).
    pub fn lookup(&self, cluster: &ClusterRef, labels: &BTreeMap<String, String>) -> BTreeSet<String> {
        let mut profiles = self.profiles_matching_cluster(cluster);
        for (profile, entry) in &self.profile_selectors {
            if entry.parsed.as_ref().is_some_and(|s| s.matches(labels)) {
                profiles.insert(profile.clone());
            }
        }
        profiles
    }

    /// Snapshot of the profiles that matched this cluster at their last
    /// reconcile (the pure index side, no selector re-evaluation).
    pub fn profiles_matching_cluster(&self, cluster: &ClusterRef) -> BTreeSet<String> {
        self.cluster_to_profiles
            .get(cluster)
            .cloned()
            .unwrap_or_default()
    }

    /// Raw selector last recorded for a profile, for introspection
    pub fn selector_of(&self, profile: &str) -> Option<&str> {
        self.profile_selectors.get(profile).map(|e| e.raw.as_str())
    }
}
