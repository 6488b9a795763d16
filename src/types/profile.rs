// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ClusterProfile: the user-authored declaration of which clusters get which add-ons.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{CustomResource, Resource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::error::{DroverError, Result};
use crate::types::ClusterRef;

/// How drover keeps derived objects in sync with the profile.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub enum SyncMode {
    /// Keep ClusterSummaries tracking the profile spec
    #[default]
    Continuous,
    /// Freeze each ClusterSummary spec after the first write
    OneTime,
    /// Produce ClusterReports instead of driving deployments
    DryRun,
}

/// A Helm release to deploy on matching clusters. Forwarded verbatim to the
/// deployment agents; drover never interprets it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelmChart {
    pub repository_url: String,
    pub repository_name: String,
    pub chart_name: String,
    pub chart_version: String,
    pub release_name: String,
    pub release_namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
}

/// Reference to a ConfigMap/Secret holding raw manifests to apply.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "config.drover.io", version = "v1alpha1", kind = "ClusterProfile")]
#[kube(status = "ClusterProfileStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfileSpec {
    /// Label selector (e.g. "env=prod,tier!=db") picking workload clusters
    #[serde(default)]
    pub cluster_selector: String,
    #[serde(default)]
    pub sync_mode: SyncMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub helm_charts: Vec<HelmChart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_refs: Vec<PolicyRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfileStatus {
    /// Workload clusters currently matching the profile's selector
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matching_cluster_refs: Vec<MatchingClusterRef>,
}

/// A matching workload cluster, as persisted in the profile status.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchingClusterRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl From<&ClusterRef> for MatchingClusterRef {
    fn from(r: &ClusterRef) -> Self {
        MatchingClusterRef {
            kind: "Cluster".to_string(),
            namespace: r.namespace.clone(),
            name: r.name.clone(),
        }
    }
}

impl ClusterProfile {
    pub fn is_dry_run(&self) -> bool {
        self.spec.sync_mode == SyncMode::DryRun
    }

    pub fn is_one_time(&self) -> bool {
        self.spec.sync_mode == SyncMode::OneTime
    }

    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// The match set currently persisted in status
    pub fn matching_clusters(&self) -> Vec<ClusterRef> {
        self.status
            .as_ref()
            .map(|s| {
                s.matching_cluster_refs
                    .iter()
                    .map(|r| ClusterRef::new(&r.namespace, &r.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// OwnerReference pointing at this profile, for stamping derived objects.
    /// Not a controller reference: ClusterConfigurations are co-owned by
    /// every matching profile. Requires the profile to have been persisted
    /// (uid set).
    pub fn owner_reference(&self) -> Result<OwnerReference> {
        self.owner_ref(&())
            .ok_or_else(|| DroverError::MissingMetadata(format!("ClusterProfile {}", self.name_any())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn make_profile(name: &str, selector: &str, sync_mode: SyncMode) -> ClusterProfile {
        ClusterProfile {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                uid: Some("test-uid".to_string()),
                ..Default::default()
            },
            spec: ClusterProfileSpec {
                cluster_selector: selector.to_string(),
                sync_mode,
                helm_charts: Vec::new(),
                policy_refs: Vec::new(),
            },
            status: None,
        }
    }

    #[test]
    fn test_sync_mode_helpers() {
        assert!(make_profile("p", "", SyncMode::DryRun).is_dry_run());
        assert!(!make_profile("p", "", SyncMode::Continuous).is_dry_run());
        assert!(make_profile("p", "", SyncMode::OneTime).is_one_time());
    }

    #[test]
    fn test_matching_clusters_empty_without_status() {
        let profile = make_profile("p", "env=prod", SyncMode::Continuous);
        assert!(profile.matching_clusters().is_empty());
    }

    #[test]
    fn test_matching_clusters_from_status() {
        let mut profile = make_profile("p", "env=prod", SyncMode::Continuous);
        profile.status = Some(ClusterProfileStatus {
            matching_cluster_refs: vec![
                MatchingClusterRef {
                    kind: "Cluster".to_string(),
                    namespace: "fleet".to_string(),
                    name: "c1".to_string(),
                },
                MatchingClusterRef {
                    kind: "Cluster".to_string(),
                    namespace: "fleet".to_string(),
                    name: "c2".to_string(),
                },
            ],
        });

        let matches = profile.matching_clusters();
        assert_eq!(matches.len(), 2);
        assert!(matches.contains(&ClusterRef::new("fleet", "c1")));
        assert!(matches.contains(&ClusterRef::new("fleet", "c2")));
    }

    #[test]
    fn test_owner_reference_carries_profile_identity() {
        let profile = make_profile("p1", "env=prod", SyncMode::Continuous);
        let owner = profile.owner_reference().unwrap();
        assert_eq!(owner.kind, "ClusterProfile");
        assert_eq!(owner.name, "p1");
        assert_eq!(owner.uid, "test-uid");
    }

    #[test]
    fn test_sync_mode_serializes_as_plain_variant() {
        let json = serde_json::to_string(&SyncMode::DryRun).unwrap();
        assert_eq!(json, "\"DryRun\"");
    }

    #[test]
    fn test_spec_defaults_on_deserialize() {
        let spec: ClusterProfileSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.sync_mode, SyncMode::Continuous);
        assert!(spec.cluster_selector.is_empty());
        assert!(spec.helm_charts.is_empty());
    }
}
