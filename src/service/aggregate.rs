// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fleet Aggregation Service
//!
//! Composes the per-kind inventories into one nested snapshot per cluster:
//!
//! ```text
//! {
//!   "cluster": "c1",
//!   "instances": { "s1": { "default": { "web01": { ...payload... } } } },
//!   "networks":  { "default": { "lxdbr0": { ...payload... } } }
//! }
//! ```
//!
//! Each kind nests by its own scope path (server, project, parent,
//! volume type, name; absent levels skipped). Snapshots are assembled on
//! demand from repository reads and never trigger a sync.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use super::sync::InventorySync;
use crate::directory::ClusterDirectory;
use crate::domain::{InventoryRecord, ResourceKind};
use crate::errors::InventoryResult;
use crate::filter::ResourceFilter;

/// Nested mapping keyed by scope path segments
pub type ScopeTree = BTreeMap<String, ScopeNode>;

/// One level of a [`ScopeTree`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScopeNode {
    Branch(ScopeTree),
    Leaf(serde_json::Value),
}

impl ScopeNode {
    /// Follow `path` below this node
    pub fn get(&self, path: &[&str]) -> Option<&ScopeNode> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                Self::Branch(tree) => tree.get(*head)?.get(rest),
                Self::Leaf(_) => None,
            },
        }
    }

    pub fn as_leaf(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Branch(_) => None,
        }
    }
}

/// Snapshot of one cluster across resource kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryAggregate {
    pub cluster: String,

    #[serde(flatten)]
    pub resources: BTreeMap<ResourceKind, ScopeTree>,
}

impl InventoryAggregate {
    fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            resources: BTreeMap::new(),
        }
    }

    /// Tree of one kind, if emitted
    pub fn kind(&self, kind: ResourceKind) -> Option<&ScopeTree> {
        self.resources.get(&kind)
    }

    /// Payload stored at `path` under `kind`
    pub fn leaf(&self, kind: ResourceKind, path: &[&str]) -> Option<&serde_json::Value> {
        let (head, rest) = path.split_first()?;
        self.kind(kind)?.get(*head)?.get(rest)?.as_leaf()
    }

    fn insert(&mut self, record: &InventoryRecord) {
        let tree = self.resources.entry(record.kind).or_default();
        insert_path(tree, &record.scope_path(), record.object.clone());
    }
}

fn insert_path(tree: &mut ScopeTree, path: &[&str], value: serde_json::Value) {
    match path {
        [] => {}
        [leaf] => {
            tree.insert(leaf.to_string(), ScopeNode::Leaf(value));
        }
        [head, rest @ ..] => {
            let node = tree
                .entry(head.to_string())
                .or_insert_with(|| ScopeNode::Branch(ScopeTree::new()));
            if let ScopeNode::Leaf(_) = node {
                *node = ScopeNode::Branch(ScopeTree::new());
            }
            if let ScopeNode::Branch(subtree) = node {
                insert_path(subtree, rest, value);
            }
        }
    }
}

/// Selection applied to every kind of an aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateFilter {
    pub cluster: Option<String>,

    /// Applied to server-scoped kinds only
    pub servers: Vec<String>,

    /// Applied to project-scoped kinds only
    pub projects: Vec<String>,

    pub expression: Option<String>,

    /// Kinds to include, each emitted even when empty; `None` means every
    /// kind, with empty ones omitted
    pub kinds: Option<BTreeSet<ResourceKind>>,
}

impl AggregateFilter {
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

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.kinds.get_or_insert_with(BTreeSet::new).insert(kind);
        self
    }

    fn has_expression(&self) -> bool {
        self.expression.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Per-kind filter for one cluster
    fn for_kind(&self, kind: ResourceKind, cluster: &str) -> ResourceFilter {
        let layout = kind.layout();
        let mut filter = ResourceFilter::new().with_cluster(cluster);

        if layout.server {
            filter.servers = self.servers.clone();
        }
        if layout.project {
            filter.projects = self.projects.clone();
        }
        filter.expression = self.expression.clone();

        filter
    }
}

/// Read-only composition of per-kind inventories
pub struct AggregationService {
    services: BTreeMap<ResourceKind, Arc<dyn InventorySync>>,
    clusters: Arc<dyn ClusterDirectory>,
}

impl AggregationService {
    pub fn new(
        services: impl IntoIterator<Item = Arc<dyn InventorySync>>,
        clusters: Arc<dyn ClusterDirectory>,
    ) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|service| (service.kind(), service))
                .collect(),
            clusters,
        }
    }

    /// One snapshot per cluster matched by `filter`, in cluster name order
    pub async fn get_all_with_filter(
        &self,
        filter: &AggregateFilter,
    ) -> InventoryResult<Vec<InventoryAggregate>> {
        let kinds: Vec<ResourceKind> = match &filter.kinds {
            Some(kinds) => kinds.iter().copied().collect(),
            None => self.services.keys().copied().collect(),
        };

        let mut aggregates = Vec::new();

        for cluster in self.clusters.get_all().await? {
            if filter
                .cluster
                .as_deref()
                .is_some_and(|wanted| !wanted.is_empty() && wanted != cluster.name)
            {
                continue;
            }

            let mut aggregate = InventoryAggregate::new(&cluster.name);
            let mut matched = 0;

            for kind in &kinds {
                if filter.kinds.is_some() {
                    aggregate.resources.entry(*kind).or_default();
                }

                let Some(service) = self.services.get(kind) else {
                    continue;
                };

                let records = service
                    .get_all_with_filter(&filter.for_kind(*kind, &cluster.name))
                    .await?;
                matched += records.len();

                for record in &records {
                    aggregate.insert(record);
                }
            }

            if filter.has_expression() && matched == 0 {
                debug!("No records in cluster {} match the expression", cluster.name);
                continue;
            }

            aggregates.push(aggregate);
        }

        Ok(aggregates)
    }
}
