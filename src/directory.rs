// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster and Server Directory Services
//!
//! The inventory never owns the fleet topology; it asks a directory which
//! clusters exist, which servers belong to them and how to reach them.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::{Cluster, Server};
use crate::errors::{InventoryError, InventoryResult};

/// Enumerates clusters
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// All clusters, ordered by name
    async fn get_all(&self) -> InventoryResult<Vec<Cluster>>;

    /// # Errors
    ///
    /// - `NotFound` if no cluster has this name
    async fn get_by_name(&self, name: &str) -> InventoryResult<Cluster>;
}

/// Enumerates servers
#[async_trait]
pub trait ServerDirectory: Send + Sync {
    /// Members of `cluster`, ordered by name
    async fn get_all_by_cluster(&self, cluster: &str) -> InventoryResult<Vec<Server>>;

    /// # Errors
    ///
    /// - `NotFound` if no server has this name
    async fn get_by_name(&self, name: &str) -> InventoryResult<Server>;
}

/// Fixed topology held in memory, typically built from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    clusters: BTreeMap<String, Cluster>,
    servers: BTreeMap<String, Server>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a cluster
    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.clusters.insert(cluster.name.clone(), cluster);
        self
    }

    /// Add or replace a server
    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.insert(server.name.clone(), server);
        self
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.values()
    }
}

#[async_trait]
impl ClusterDirectory for StaticDirectory {
    async fn get_all(&self) -> InventoryResult<Vec<Cluster>> {
        Ok(self.clusters.values().cloned().collect())
    }

    async fn get_by_name(&self, name: &str) -> InventoryResult<Cluster> {
        self.clusters
            .get(name)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("cluster {}", name)))
    }
}

#[async_trait]
impl ServerDirectory for StaticDirectory {
    async fn get_all_by_cluster(&self, cluster: &str) -> InventoryResult<Vec<Server>> {
        Ok(self
            .servers
            .values()
            .filter(|server| server.cluster.as_deref() == Some(cluster))
            .cloned()
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> InventoryResult<Server> {
        self.servers
            .get(name)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("server {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::new()
            .with_cluster(Cluster {
                name: "c1".to_string(),
                connection_url: "https://10.0.0.1:8443".to_string(),
                certificate: None,
            })
            .with_server(Server {
                name: "s2".to_string(),
                cluster: Some("c1".to_string()),
                connection_url: "https://10.0.0.12:8443".to_string(),
                certificate: None,
            })
            .with_server(Server {
                name: "s1".to_string(),
                cluster: Some("c1".to_string()),
                connection_url: "https://10.0.0.11:8443".to_string(),
                certificate: None,
            })
            .with_server(Server {
                name: "standalone".to_string(),
                cluster: None,
                connection_url: "https://10.0.0.99:8443".to_string(),
                certificate: None,
            })
    }

    #[tokio::test]
    async fn test_servers_by_cluster_are_ordered() {
        let names: Vec<_> = directory()
            .get_all_by_cluster("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_lookups() {
        let dir = directory();

        assert_eq!(ClusterDirectory::get_all(&dir).await.unwrap().len(), 1);
        assert!(ClusterDirectory::get_by_name(&dir, "c9")
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            ServerDirectory::get_by_name(&dir, "standalone")
                .await
                .unwrap()
                .cluster,
            None
        );
    }
}
