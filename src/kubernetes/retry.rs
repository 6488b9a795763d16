// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Optimistic-concurrency retry for read-modify-write updates.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::constants::conflict_retry::{BACKOFF_BASE_MILLIS, BACKOFF_MAX_MILLIS, MAX_ATTEMPTS};
use crate::error::Result;

/// Run `op` (a full read-modify-write cycle) until it succeeds or fails with
/// something other than a resource-version conflict. Conflicts are retried
/// with capped exponential backoff up to MAX_ATTEMPTS; the last conflict is
/// returned if the budget runs out.
pub async fn retry_on_conflict<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = Duration::from_millis(BACKOFF_BASE_MILLIS);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                debug!(attempt, "Update conflicted, retrying in {:?}", backoff);
                sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_millis(BACKOFF_MAX_MILLIS));
            }
            other => return other,
        }
    }
}
