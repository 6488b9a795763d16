// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterReport: what a DryRun profile *would* change on a cluster. Created
//! by drover, filled in by the deployment agents.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "config.drover.io", version = "v1alpha1", kind = "ClusterReport")]
#[kube(namespaced)]
#[kube(status = "ClusterReportStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterReportSpec {
    pub cluster_namespace: String,
    pub cluster_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReportStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_reports: Vec<ReleaseReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_reports: Vec<ResourceReport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReport {
    pub release_name: String,
    pub release_namespace: String,
    pub action: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReport {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub action: String,
}

impl ClusterReport {
    /// Deterministic report name for a (profile, cluster) pair
    pub fn name_for(profile_name: &str, cluster_name: &str) -> String {
        format!("{}--{}", profile_name, cluster_name)
    }
}
