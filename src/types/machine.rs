// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Foreign Cluster API `Machine` type. A running control-plane machine is
//! what makes a workload cluster ready to be configured.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::constants::capi;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "cluster.x-k8s.io", version = "v1beta1", kind = "Machine")]
#[kube(namespaced)]
#[kube(status = "MachineStatus")]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Name of the cluster this machine belongs to
    #[serde(default)]
    pub cluster_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Typed rendition of Machine.status.phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachinePhase {
    Pending,
    Provisioning,
    Provisioned,
    Running,
    Deleting,
    Failed,
    Unknown,
}

impl Machine {
    /// Typed phase; anything unrecognized (or unset) maps to Unknown
    pub fn phase(&self) -> MachinePhase {
        match self
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or("")
        {
            "Pending" => MachinePhase::Pending,
            "Provisioning" => MachinePhase::Provisioning,
            "Provisioned" => MachinePhase::Provisioned,
            "Running" => MachinePhase::Running,
            "Deleting" => MachinePhase::Deleting,
            "Failed" => MachinePhase::Failed,
            _ => MachinePhase::Unknown,
        }
    }

    /// Control-plane machines are marked with the cluster.x-k8s.io label
    pub fn is_control_plane(&self) -> bool {
        self.metadata
            .labels
            .as_ref()
            .is_some_and(|l| l.contains_key(capi::CONTROL_PLANE_LABEL))
    }

    /// Owning cluster name: the CAPI label, falling back to spec.clusterName
    pub fn cluster_name(&self) -> Option<String> {
        let from_label = self
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(capi::CLUSTER_NAME_LABEL))
            .cloned();
        from_label.or_else(|| (!self.spec.cluster_name.is_empty()).then(|| self.spec.cluster_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn make_machine(
        namespace: &str,
        name: &str,
        cluster: &str,
        control_plane: bool,
        phase: Option<&str>,
    ) -> Machine {
        let mut labels = BTreeMap::from([(capi::CLUSTER_NAME_LABEL.to_string(), cluster.to_string())]);
        if control_plane {
            labels.insert(capi::CONTROL_PLANE_LABEL.to_string(), String::new());
        }
        Machine {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            spec: MachineSpec {
                cluster_name: cluster.to_string(),
            },
            status: phase.map(|p| MachineStatus {
                phase: Some(p.to_string()),
            }),
        }
    }

    #[test]
    fn test_phase_running() {
        let machine = make_machine("fleet", "m1", "c1", true, Some("Running"));
        assert_eq!(machine.phase(), MachinePhase::Running);
    }

    #[test]
    fn test_phase_unknown_when_missing_or_unrecognized() {
        assert_eq!(
            make_machine("fleet", "m1", "c1", true, None).phase(),
            MachinePhase::Unknown
        );
        assert_eq!(
            make_machine("fleet", "m1", "c1", true, Some("Levitating")).phase(),
            MachinePhase::Unknown
        );
    }

    #[test]
    fn test_is_control_plane_from_label() {
        assert!(make_machine("fleet", "m1", "c1", true, None).is_control_plane());
        assert!(!make_machine("fleet", "m2", "c1", false, None).is_control_plane());
    }

    #[test]
    fn test_cluster_name_prefers_label() {
        let mut machine = make_machine("fleet", "m1", "c1", false, None);
        machine.spec.cluster_name = "other".to_string();
        assert_eq!(machine.cluster_name().as_deref(), Some("c1"));
    }

    #[test]
    fn test_cluster_name_falls_back_to_spec() {
        let mut machine = make_machine("fleet", "m1", "c1", false, None);
        machine.metadata.labels = None;
        assert_eq!(machine.cluster_name().as_deref(), Some("c1"));
    }
}
