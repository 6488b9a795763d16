// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fan-out: create, align, and prune the derived per-cluster objects for a
//! profile's match set.

pub mod configurations;
pub mod reports;
pub mod summaries;
