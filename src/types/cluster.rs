// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Foreign Cluster API `Cluster` type. Drover only reads labels and the
//! deletion timestamp; the spec and status fields are the minimal subset we
//! deserialize.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::types::ClusterRef;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "cluster.x-k8s.io", version = "v1beta1", kind = "Cluster")]
#[kube(namespaced)]
#[kube(status = "ClusterApiStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterApiSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterApiStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl Cluster {
    /// A cluster with a deletion timestamp is terminating and never matches
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    pub fn cluster_ref(&self) -> ClusterRef {
        ClusterRef::new(&self.namespace().unwrap_or_default(), &self.name_any())
    }
}
