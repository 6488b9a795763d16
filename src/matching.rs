// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label selector parsing and cluster matching.
//!
//! Selectors use the equality-based Kubernetes syntax: comma-separated
//! requirements of the form `k=v`, `k==v`, `k!=v`, `k` (exists) or `!k`
//! (does not exist). An empty selector matches every cluster; an
//! unparseable one matches none.

use std::collections::BTreeMap;

use kube::{api::ListParams, Api, Client};
use tracing::{instrument, warn};

use crate::error::{DroverError, Result};
use crate::types::cluster::Cluster;
use crate::types::ClusterRef;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    Eq(String, String),
    NotEq(String, String),
    Exists(String),
    NotExists(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Eq(k, v) => labels.get(k) == Some(v),
            Requirement::NotEq(k, v) => labels.get(k) != Some(v),
            Requirement::Exists(k) => labels.contains_key(k),
            Requirement::NotExists(k) => !labels.contains_key(k),
        }
    }
}

/// A parsed cluster selector; the conjunction of its requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// Parse the equality-based selector syntax. Empty input yields a
    /// selector matching everything.
    pub fn parse(raw: &str) -> Result<Selector> {
        let mut requirements = Vec::new();

        for term in raw.split(',') {
            let term = term.trim();
            if term.is_empty() {
                if raw.trim().is_empty() {
                    continue;
                }
                return Err(DroverError::InvalidSelector(raw.to_string()));
            }

            let requirement = if let Some((key, value)) = term.split_once("!=") {
                Requirement::NotEq(parse_key(key, raw)?, parse_value(value, raw)?)
            } else if let Some((key, value)) = term.split_once("==") {
                Requirement::Eq(parse_key(key, raw)?, parse_value(value, raw)?)
            } else if let Some((key, value)) = term.split_once('=') {
                Requirement::Eq(parse_key(key, raw)?, parse_value(value, raw)?)
            } else if let Some(key) = term.strip_prefix('!') {
                Requirement::NotExists(parse_key(key, raw)?)
            } else {
                Requirement::Exists(parse_key(term, raw)?)
            };
            requirements.push(requirement);
        }

        Ok(Selector { requirements })
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

fn parse_key(key: &str, raw: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '!' || c == '=') {
        return Err(DroverError::InvalidSelector(raw.to_string()));
    }
    Ok(key.to_string())
}

fn parse_value(value: &str, raw: &str) -> Result<String> {
    let value = value.trim();
    if value.contains(|c: char| c.is_whitespace() || c == '!' || c == '=') {
        return Err(DroverError::InvalidSelector(raw.to_string()));
    }
    Ok(value.to_string())
}

/// List every non-terminating workload cluster whose labels satisfy the
/// profile's selector. Returns refs in no particular order; an unparseable
/// selector matches nothing.
#[instrument(skip(client))]
pub async fn get_matching_clusters(client: &Client, selector: &str) -> Result<Vec<ClusterRef>> {
    let parsed = match Selector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            warn!("Unparseable cluster selector, matching nothing: {}", e);
            return Ok(Vec::new());
        }
    };

    let clusters: Api<Cluster> = Api::all(client.clone());
    let cluster_list = clusters.list(&ListParams::default()).await?;

    let empty = BTreeMap::new();
    Ok(cluster_list
        .items
        .into_iter()
        .filter(|c| !c.is_deleting())
        .filter(|c| parsed.matches(c.metadata.labels.as_ref().unwrap_or(&empty)))
        .map(|c| c.cluster_ref())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_empty_matches_everything() {
        let selector = Selector::parse("").unwrap();
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("env", "prod")])));
    }

    #[test]
    fn test_equality_requirement() {
        let selector = Selector::parse("env=prod").unwrap();
        assert!(selector.matches(&labels(&[("env", "prod")])));
        assert!(!selector.matches(&labels(&[("env", "dev")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn test_double_equals_is_equality() {
        let selector = Selector::parse("env==prod").unwrap();
        assert!(selector.matches(&labels(&[("env", "prod")])));
        assert!(!selector.matches(&labels(&[("env", "dev")])));
    }

    #[test]
    fn test_inequality_requirement() {
        let selector = Selector::parse("tier!=db").unwrap();
        assert!(selector.matches(&labels(&[("tier", "web")])));
        assert!(!selector.matches(&labels(&[("tier", "db")])));
        // Absent key satisfies !=
        assert!(selector.matches(&labels(&[])));
    }

    #[test]
    fn test_exists_and_not_exists() {
        let exists = Selector::parse("env").unwrap();
        assert!(exists.matches(&labels(&[("env", "anything")])));
        assert!(!exists.matches(&labels(&[])));

        let not_exists = Selector::parse("!env").unwrap();
        assert!(!not_exists.matches(&labels(&[("env", "anything")])));
        assert!(not_exists.matches(&labels(&[])));
    }

    #[test]
    fn test_conjunction_of_requirements() {
        let selector = Selector::parse("env=prod,tier!=db,region").unwrap();
        assert!(selector.matches(&labels(&[("env", "prod"), ("region", "eu"), ("tier", "web")])));
        assert!(!selector.matches(&labels(&[("env", "prod"), ("region", "eu"), ("tier", "db")])));
        assert!(!selector.matches(&labels(&[("env", "prod"), ("tier", "web")])));
    }

    #[test]
    fn test_whitespace_is_tolerated_around_terms() {
        let selector = Selector::parse(" env = prod , tier != db ").unwrap();
        assert!(selector.matches(&labels(&[("env", "prod"), ("tier", "web")])));
    }

    #[test]
    fn test_unparseable_selectors_error() {
        assert!(Selector::parse("env=prod,").is_err());
        assert!(Selector::parse("=prod").is_err());
        assert!(Selector::parse("env=pr od").is_err());
        assert!(Selector::parse("env!!prod").is_err());
    }

    #[test]
    fn test_empty_value_is_allowed() {
        // "k=" selects labels whose value is the empty string, as the
        // upstream syntax does.
        let selector = Selector::parse("env=").unwrap();
        assert!(selector.matches(&labels(&[("env", "")])));
        assert!(!selector.matches(&labels(&[("env", "prod")])));
    }

    mod api {
        use super::*;
        use crate::test_utils::{cluster_list_json, MockService};

        const CLUSTERS_PATH: &str = "/apis/cluster.x-k8s.io/v1beta1/clusters";

        #[tokio::test]
        async fn test_get_matching_clusters_filters_by_selector() {
            let client = MockService::new()
                .on_get(
                    CLUSTERS_PATH,
                    200,
                    &cluster_list_json(&[
                        ("a", "c1", &[("env", "prod")], false),
                        ("a", "c2", &[("env", "dev")], false),
                    ]),
                )
                .into_client();

            let matches = get_matching_clusters(&client, "env=prod").await.unwrap();
            assert_eq!(matches, vec![ClusterRef::new("a", "c1")]);
        }

        #[tokio::test]
        async fn test_get_matching_clusters_skips_terminating() {
            let client = MockService::new()
                .on_get(
                    CLUSTERS_PATH,
                    200,
                    &cluster_list_json(&[
                        ("a", "c1", &[("env", "prod")], true),
                        ("a", "c2", &[("env", "prod")], false),
                    ]),
                )
                .into_client();

            let matches = get_matching_clusters(&client, "env=prod").await.unwrap();
            assert_eq!(matches, vec![ClusterRef::new("a", "c2")]);
        }

        #[tokio::test]
        async fn test_get_matching_clusters_bad_selector_matches_nothing() {
            let client = MockService::new()
                .on_get(
                    CLUSTERS_PATH,
                    200,
                    &cluster_list_json(&[("a", "c1", &[("env", "prod")], false)]),
                )
                .into_client();

            let matches = get_matching_clusters(&client, "=prod").await.unwrap();
            assert!(matches.is_empty());
        }
    }
}
