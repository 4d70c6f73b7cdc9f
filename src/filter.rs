// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Filter Model
//!
//! A [`ResourceFilter`] narrows a per-kind read by scope (cluster, servers,
//! projects, parents) and by a free-form expression over the payload.
//!
//! # Canonical form
//!
//! Filters serialize to a URL query string with keys in lexicographic order:
//!
//! ```text
//! cluster=c1&filter=status%20%3D%3D%20%27Running%27&parent=br0,lxdbr0&project=default&project=prod&server=s1&server_include_null=true
//! ```
//!
//! - `server` and `project` repeat the key once per value
//! - `parent` joins its values with `,` into one value, each value encoded
//!   on its own so a `,` inside a name stays distinguishable
//! - multi-valued fields are sorted and de-duplicated
//! - `*_include_null` is only emitted when set, as `true`
//! - unset fields are omitted; an empty filter is the empty string

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{InventoryRecord, ValidationError};
use crate::expression::ExpressionMatcher;

/// Query parameters keyed by name, values in emission order
pub type UrlValues = BTreeMap<String, Vec<String>>;

/// Keys whose values serialize as one comma-joined parameter
const COMMA_JOINED_KEYS: &[&str] = &["parent"];

/// Per-kind query over the inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFilter {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cluster: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<String>,

    /// Also match records without a server
    #[serde(default)]
    pub server_include_null: bool,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub projects: Vec<String>,

    #[serde(default)]
    pub project_include_null: bool,

    /// Network or storage pool names
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parents: Vec<String>,

    #[serde(default)]
    pub parent_include_null: bool,

    /// Boolean expression evaluated against the payload
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expression: Option<String>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.servers.push(server.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.projects.push(project.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn include_null_server(mut self) -> Self {
        self.server_include_null = true;
        self
    }

    pub fn include_null_project(mut self) -> Self {
        self.project_include_null = true;
        self
    }

    pub fn include_null_parent(mut self) -> Self {
        self.parent_include_null = true;
        self
    }

    /// Whether the filter serializes to nothing
    pub fn is_empty(&self) -> bool {
        let mut values = UrlValues::new();
        self.append_to_url_values(&mut values);
        values.is_empty()
    }

    /// Add this filter's parameters to `values`
    pub fn append_to_url_values(&self, values: &mut UrlValues) {
        if let Some(cluster) = non_empty(&self.cluster) {
            values.entry("cluster".to_string()).or_default().push(cluster.to_string());
        }

        if let Some(expression) = non_empty(&self.expression) {
            values.entry("filter".to_string()).or_default().push(expression.to_string());
        }

        for (key, list) in [
            ("parent", &self.parents),
            ("project", &self.projects),
            ("server", &self.servers),
        ] {
            for value in canonical(list) {
                values.entry(key.to_string()).or_default().push(value.to_string());
            }
        }

        for (key, set) in [
            ("parent_include_null", self.parent_include_null),
            ("project_include_null", self.project_include_null),
            ("server_include_null", self.server_include_null),
        ] {
            if set {
                values.entry(key.to_string()).or_default().push("true".to_string());
            }
        }
    }

    /// Evaluate the scoping predicates against a record
    pub fn matches_scope(&self, record: &InventoryRecord) -> bool {
        if let Some(cluster) = non_empty(&self.cluster) {
            if record.cluster != cluster {
                return false;
            }
        }

        matches_field(&self.servers, self.server_include_null, record.server.as_deref())
            && matches_field(&self.projects, self.project_include_null, record.project.as_deref())
            && matches_field(&self.parents, self.parent_include_null, record.parent.as_deref())
    }

    /// Evaluate scope and expression against a record
    pub fn matches(
        &self,
        record: &InventoryRecord,
        matcher: &dyn ExpressionMatcher,
    ) -> Result<bool, ValidationError> {
        if !self.matches_scope(record) {
            return Ok(false);
        }

        match non_empty(&self.expression) {
            Some(expression) => matcher.matches(expression, &record.object),
            None => Ok(true),
        }
    }
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = UrlValues::new();
        self.append_to_url_values(&mut values);
        write!(f, "{}", encode_url_values(&values))
    }
}

/// Encode `values` as a query string, keys in order
///
/// `parent` values are emitted as one parameter, joined with a literal `,`
/// after encoding.
pub fn encode_url_values(values: &UrlValues) -> String {
    let mut pairs = Vec::new();

    for (key, list) in values.iter().filter(|(_, list)| !list.is_empty()) {
        let key_encoded = urlencoding::encode(key);
        if COMMA_JOINED_KEYS.contains(&key.as_str()) {
            let joined = list
                .iter()
                .map(|value| urlencoding::encode(value).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(format!("{}={}", key_encoded, joined));
        } else {
            for value in list {
                pairs.push(format!("{}={}", key_encoded, urlencoding::encode(value)));
            }
        }
    }

    pairs.join("&")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn canonical(values: &[String]) -> Vec<&str> {
    let mut values: Vec<&str> = values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .collect();
    values.sort_unstable();
    values.dedup();
    values
}

fn matches_field(values: &[String], include_null: bool, field: Option<&str>) -> bool {
    if values.is_empty() {
        return true;
    }

    match field.filter(|f| !f.is_empty()) {
        Some(field) => values.iter().any(|v| v == field),
        None => include_null,
    }
}
