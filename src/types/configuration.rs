// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterConfiguration: the cluster-wide manifest ledger. One per workload
//! cluster, co-owned by every profile matching that cluster. The deployment
//! agents record what they applied in the per-profile status blocks.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::types::profile::ClusterProfile;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "config.drover.io", version = "v1alpha1", kind = "ClusterConfiguration")]
#[kube(namespaced)]
#[kube(status = "ClusterConfigurationStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfigurationSpec {}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfigurationStatus {
    /// One block per owning profile; created on attach, removed on departure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_profile_resources: Vec<ClusterProfileResource>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfileResource {
    pub cluster_profile_name: String,
    /// Per-feature deployed-resource inventory, written by the agents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub feature_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<DeployedResource>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployedResource {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ClusterConfiguration {
    /// True if the given profile appears in this configuration's owner refs.
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
