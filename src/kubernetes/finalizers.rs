// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Finalizer management for ClusterProfiles.
//!
//! The finalizer is registered before any derived object is created, so a
//! later delete is guaranteed to pass through the drain path.

use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

use crate::constants::OPERATOR_NAME;
use crate::error::Result;
use crate::types::profile::ClusterProfile;

/// Add `finalizer` to the profile and persist immediately. No-op if present.
pub async fn add_finalizer(client: &Client, profile: &ClusterProfile, finalizer: &str) -> Result<()> {
    if profile.finalizers().iter().any(|f| f == finalizer) {
        return Ok(());
    }

    let mut finalizers: Vec<String> = profile.finalizers().to_vec();
    finalizers.push(finalizer.to_string());
    patch_finalizers(client, &profile.name_any(), finalizers).await?;
    debug!(profile = %profile.name_any(), "Added finalizer");
    Ok(())
}

/// Remove `finalizer` from the profile and persist. No-op if absent.
pub async fn remove_finalizer(client: &Client, profile: &ClusterProfile, finalizer: &str) -> Result<()> {
    if !profile.finalizers().iter().any(|f| f == finalizer) {
        return Ok(());
    }

    let finalizers: Vec<String> = profile
        .finalizers()
        .iter()
        .filter(|f| f.as_str() != finalizer)
        .cloned()
        .collect();
    patch_finalizers(client, &profile.name_any(), finalizers).await?;
    debug!(profile = %profile.name_any(), "Removed finalizer");
    Ok(())
}

async fn patch_finalizers(client: &Client, name: &str, finalizers: Vec<String>) -> Result<()> {
    let profiles: Api<ClusterProfile> = Api::all(client.clone());
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    let params = PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    };
    profiles.patch(name, &params, &Patch::Merge(&patch)).await?;
    Ok(())
}
