// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::env;
use std::time::Duration;

use anyhow::Result;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// How many ClusterProfiles may reconcile in parallel
    pub concurrent_reconciles: u16,
    /// How long to wait before re-checking a profile whose deletion is draining
    pub delete_requeue_after: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let concurrent_reconciles = env::var("CONCURRENT_RECONCILES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let delete_requeue_secs: u64 = env::var("DELETE_REQUEUE_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        Ok(Config {
            concurrent_reconciles,
            delete_requeue_after: Duration::from_secs(delete_requeue_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            concurrent_reconciles: 10,
            delete_requeue_after: Duration::from_secs(20),
        }
    }
}
