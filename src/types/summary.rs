// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterSummary: the per-(profile, cluster) execution record the
//! deployment agents consume.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::types::profile::{ClusterProfile, ClusterProfileSpec};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "config.drover.io", version = "v1alpha1", kind = "ClusterSummary")]
#[kube(namespaced)]
#[kube(status = "ClusterSummaryStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummarySpec {
    /// Namespace of the workload cluster this summary targets
    pub cluster_namespace: String,
    /// Name of the workload cluster this summary targets
    pub cluster_name: String,
    /// Snapshot of the producing profile's spec
    pub cluster_profile_spec: ClusterProfileSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummaryStatus {
    /// Per-feature deployment state, written by the deployment agents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_summaries: Vec<FeatureSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSummary {
    pub feature_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

impl ClusterSummary {
    /// Deterministic summary name for a (profile, cluster) pair.
    /// The summary itself lives in the cluster's namespace.
    pub fn name_for(profile_name: &str, cluster_name: &str) -> String {
        format!("{}--{}", profile_name, cluster_name)
    }

    /// True if this summary was produced by the given profile.
    /// Matched by kind + name; uid is checked only when both sides carry one.
    pub fn is_owned_by(&self, profile: &ClusterProfile) -> bool {
        let profile_uid = profile.uid();
        self.owner_references().iter().any(|r| {
            r.kind == "ClusterProfile"
                && r.name == profile.name_any()
                && profile_uid.as_ref().is_none_or(|uid| &r.uid == uid)
        })
    }
}
