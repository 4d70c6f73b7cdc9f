// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fleet Inventory
//!
//! Wires one [`InventorySyncService`] per resource kind over shared client and
//! directory ports, and fans sync requests out across kinds.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::aggregate::AggregationService;
use super::cancellable;
use super::sync::{InventorySync, InventorySyncService};
use crate::client::ServerClient;
use crate::directory::{ClusterDirectory, ServerDirectory};
use crate::domain::ResourceKind;
use crate::errors::InventoryResult;
use crate::repository::{MemoryRepository, ResourceRepository};

/// Sync services for every configured kind
pub struct FleetInventory {
    services: BTreeMap<ResourceKind, Arc<dyn InventorySync>>,
    clusters: Arc<dyn ClusterDirectory>,
}

impl FleetInventory {
    /// Build services over the given repositories, one per kind
    ///
    /// A later repository for the same kind replaces an earlier one.
    pub fn new(
        repositories: impl IntoIterator<Item = Arc<dyn ResourceRepository>>,
        client: Arc<dyn ServerClient>,
        clusters: Arc<dyn ClusterDirectory>,
        servers: Arc<dyn ServerDirectory>,
    ) -> Self {
        let services = repositories
            .into_iter()
            .map(|repo| {
                let service: Arc<dyn InventorySync> = Arc::new(InventorySyncService::new(
                    repo,
                    Arc::clone(&client),
                    Arc::clone(&clusters),
                    Arc::clone(&servers),
                ));
                (service.kind(), service)
            })
            .collect();

        Self { services, clusters }
    }

    /// Build services over fresh in-memory repositories
    pub fn in_memory(
        kinds: impl IntoIterator<Item = ResourceKind>,
        client: Arc<dyn ServerClient>,
        clusters: Arc<dyn ClusterDirectory>,
        servers: Arc<dyn ServerDirectory>,
    ) -> Self {
        let repositories = kinds.into_iter().map(|kind| {
            let repo: Arc<dyn ResourceRepository> = Arc::new(MemoryRepository::new(kind));
            repo
        });

        Self::new(repositories, client, clusters, servers)
    }

    /// Configured kinds in sync order
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.services.keys().copied()
    }

    /// Service of one kind
    pub fn service(&self, kind: ResourceKind) -> Option<Arc<dyn InventorySync>> {
        self.services.get(&kind).cloned()
    }

    /// Aggregation over the same repositories
    pub fn aggregation(&self) -> AggregationService {
        AggregationService::new(self.services.values().cloned(), Arc::clone(&self.clusters))
    }

    /// Sync every kind of every cluster, stopping at the first error
    pub async fn sync_all(&self, cancel: &CancellationToken) -> InventoryResult<()> {
        let clusters = cancellable(cancel, self.clusters.get_all()).await?;
        info!(
            "Starting fleet sync: {} clusters, {} kinds",
            clusters.len(),
            self.services.len()
        );

        for cluster in &clusters {
            self.sync_cluster(cancel, &cluster.name).await?;
        }

        info!("Fleet sync complete");
        Ok(())
    }

    /// Sync every kind of one cluster, stopping at the first error
    pub async fn sync_cluster(&self, cancel: &CancellationToken, cluster: &str) -> InventoryResult<()> {
        for service in self.services.values() {
            if let Err(err) = service.sync_cluster(cancel, cluster).await {
                warn!(
                    "Sync of cluster {} failed for {}: {}",
                    cluster,
                    service.kind(),
                    err
                );
                return Err(err);
            }
        }

        Ok(())
    }

    /// Sync every kind through one server, stopping at the first error
    pub async fn sync_server(&self, cancel: &CancellationToken, server: &str) -> InventoryResult<()> {
        for service in self.services.values() {
            if let Err(err) = service.sync_server(cancel, server).await {
                warn!(
                    "Sync of server {} failed for {}: {}",
                    server,
                    service.kind(),
                    err
                );
                return Err(err);
            }
        }

        Ok(())
    }
}
