// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Filter Canonicalization

use cim_inventory::ResourceFilter;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9 :&=,]{0,6}", 0..5)
}

fn build(
    cluster: &str,
    servers: &[String],
    projects: &[String],
    parents: &[String],
    include_null: bool,
) -> ResourceFilter {
    let mut filter = ResourceFilter::new().with_cluster(cluster);
    for server in servers {
        filter = filter.with_server(server.clone());
    }
    for project in projects {
        filter = filter.with_project(project.clone());
    }
    for parent in parents {
        filter = filter.with_parent(parent.clone());
    }
    if include_null {
        filter = filter.include_null_parent();
    }
    filter
}

fn reversed(values: &[String]) -> Vec<String> {
    values.iter().rev().cloned().collect()
}

proptest! {
    /// Property: Serialization does not depend on insertion order
    #[test]
    fn prop_order_independent(
        cluster in "[a-z0-9]{0,4}",
        servers in names(),
        projects in names(),
        parents in "[a-z0-9]{1,4}".prop_map(|p| vec![p.clone(), format!("{}x", p)]),
        include_null in any::<bool>(),
    ) {
        let forward = build(&cluster, &servers, &projects, &parents, include_null);
        let backward = build(
            &cluster,
            &reversed(&servers),
            &reversed(&projects),
            &reversed(&parents),
            include_null,
        );

        prop_assert_eq!(forward.to_string(), backward.to_string());
    }

    /// Property: Duplicates never change the canonical form
    #[test]
    fn prop_duplicates_collapse(servers in names()) {
        let once = build("c1", &servers, &[], &[], false);
        let doubled: Vec<String> = servers.iter().chain(servers.iter()).cloned().collect();
        let twice = build("c1", &doubled, &[], &[], false);

        prop_assert_eq!(once.to_string(), twice.to_string());
    }

    /// Property: Keys appear in lexicographic order
    #[test]
    fn prop_keys_sorted(
        servers in names(),
        projects in names(),
        expression in "[a-z]{1,4} == '[a-z]{1,4}'",
    ) {
        let filter = build("c1", &servers, &projects, &[], true).with_expression(expression);
        let serialized = filter.to_string();
        let keys: Vec<&str> = serialized
            .split('&')
            .filter_map(|pair| pair.split('=').next())
            .collect();

        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    /// Property: Different parent sets never share a serialization, even
    /// when names contain the join character
    #[test]
    fn prop_parent_sets_distinguishable(
        left in prop::collection::vec("[ab,]{1,3}", 1..4),
        right in prop::collection::vec("[ab,]{1,3}", 1..4),
    ) {
        let left_set: BTreeSet<&String> = left.iter().collect();
        let right_set: BTreeSet<&String> = right.iter().collect();
        prop_assume!(left_set != right_set);

        let left = build("", &[], &[], &left, false);
        let right = build("", &[], &[], &right, false);
        prop_assert_ne!(left.to_string(), right.to_string());
    }
}
