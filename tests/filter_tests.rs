// Copyright (c) 2025 - Cowboy AI, Inc.
//! Canonical filter serialization and scope matching

use pretty_assertions::assert_eq;
use test_case::test_case;

use cim_inventory::filter::{encode_url_values, UrlValues};
use cim_inventory::ResourceFilter;

#[test_case(ResourceFilter::new(), "" ; "empty filter")]
#[test_case(ResourceFilter::new().with_cluster("c1"), "cluster=c1" ; "cluster only")]
#[test_case(
    ResourceFilter::new().with_project("prod").with_project("default").with_project("prod"),
    "project=default&project=prod"
    ; "projects sorted and deduplicated"
)]
#[test_case(
    ResourceFilter::new().with_parent("local").with_parent("ceph"),
    "parent=ceph,local"
    ; "parents joined"
)]
#[test_case(
    ResourceFilter::new().with_parent("a,b"),
    "parent=a%2Cb"
    ; "comma inside one parent encoded"
)]
#[test_case(
    ResourceFilter::new().with_parent("a,b").with_parent("c"),
    "parent=a%2Cb,c"
    ; "encoded parents joined with literal comma"
)]
#[test_case(
    ResourceFilter::new().with_server("s1").include_null_server(),
    "server=s1&server_include_null=true"
    ; "include null emitted when set"
)]
#[test_case(
    ResourceFilter::new().with_expression("name == 'a b'"),
    "filter=name%20%3D%3D%20%27a%20b%27"
    ; "expression percent encoded"
)]
#[test_case(
    ResourceFilter::new().with_cluster("").with_server(""),
    ""
    ; "empty values omitted"
)]
fn test_canonical_form(filter: ResourceFilter, expected: &str) {
    assert_eq!(filter.to_string(), expected);
    assert_eq!(filter.is_empty(), expected.is_empty());
}

#[test]
fn test_field_order_does_not_change_serialization() {
    let a = ResourceFilter::new()
        .with_cluster("c1")
        .with_server("s2")
        .with_server("s1")
        .with_project("default")
        .include_null_project()
        .with_expression("status == 'Running'");
    let b = ResourceFilter::new()
        .with_expression("status == 'Running'")
        .include_null_project()
        .with_project("default")
        .with_server("s1")
        .with_server("s2")
        .with_cluster("c1");

    assert_eq!(a.to_string(), b.to_string());
}

#[test]
fn test_append_to_existing_url_values() {
    let mut values = UrlValues::new();
    values.insert("recursion".to_string(), vec!["1".to_string()]);

    ResourceFilter::new()
        .with_cluster("c1")
        .with_server("s1")
        .append_to_url_values(&mut values);

    assert_eq!(encode_url_values(&values), "cluster=c1&recursion=1&server=s1");
}
