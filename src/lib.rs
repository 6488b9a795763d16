// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod drift_detection;
pub mod error;
pub mod fanout;
pub mod index;
pub mod kubernetes;
pub mod mappers;
pub mod matching;
pub mod predicates;
pub mod readiness;
pub mod reconcilers;
pub mod types;

#[cfg(test)]
pub mod test_utils;
