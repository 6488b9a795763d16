// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Labels drover stamps on derived objects for fast list-by-owner queries
pub mod labels {
    /// Name of the ClusterProfile a ClusterSummary/ClusterReport belongs to
    pub const CLUSTER_PROFILE: &str = "drover.io/cluster-profile";
    /// Namespace of the workload cluster a ClusterSummary targets
    pub const CLUSTER_NAMESPACE: &str = "drover.io/cluster-namespace";
    /// Name of the workload cluster a ClusterSummary targets
    pub const CLUSTER_NAME: &str = "drover.io/cluster-name";
}

/// Cluster API conventions on the workload Cluster and Machine objects
pub mod capi {
    pub const GROUP: &str = "cluster.x-k8s.io";
    pub const VERSION: &str = "v1beta1";
    /// Label every Machine carries with the name of its owning cluster
    pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";
    /// Presence of this label marks a Machine as part of the control plane
    pub const CONTROL_PLANE_LABEL: &str = "cluster.x-k8s.io/control-plane";
}

/// Finalizer held on a ClusterProfile while derived objects remain
pub const CLUSTER_PROFILE_FINALIZER: &str = "config.drover.io/clusterprofile-finalizer";

/// The operator name used for patches and field management
pub const OPERATOR_NAME: &str = "drover";

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Conflict retry configuration for read-modify-write updates
pub mod conflict_retry {
    /// Maximum update attempts before giving up on a conflicting object
    pub const MAX_ATTEMPTS: u32 = 5;
    /// Initial backoff in milliseconds between attempts
    pub const BACKOFF_BASE_MILLIS: u64 = 10;
    /// Backoff cap in milliseconds
    pub const BACKOFF_MAX_MILLIS: u64 = 160;
}
