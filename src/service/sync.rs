// Copyright (c) 2025 - Cowboy AI, Inc.
//! Per-Kind Inventory Sync Service
//!
//! Fetches one resource kind from remote servers and reconciles it into that
//! kind's repository.
//!
//! # Reconciliation
//!
//! ```text
//! has_extension? ──no──> skip (Ok)
//!      │ yes
//! get_resources ──> build + validate records (one timestamp)
//!      │
//! begin ──> delete scope ──> create each ──> commit
//! ```
//!
//! Each reconciliation replaces one scope: a server for server-scoped kinds,
//! the whole cluster otherwise. Any error before `commit` drops the
//! transaction and the scope keeps its previous records.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cancellable;
use crate::client::ServerClient;
use crate::directory::{ClusterDirectory, ServerDirectory};
use crate::domain::{Endpoint, InventoryRecord, ResourceKind, Server, ValidationError};
use crate::errors::{InventoryError, InventoryResult};
use crate::filter::ResourceFilter;
use crate::repository::ResourceRepository;

/// Public contract of a per-kind sync service
#[async_trait]
pub trait InventorySync: Send + Sync {
    /// Kind handled by this service
    fn kind(&self) -> ResourceKind;

    async fn get_all_uuids_with_filter(&self, filter: &ResourceFilter) -> InventoryResult<Vec<Uuid>>;

    async fn get_all_with_filter(
        &self,
        filter: &ResourceFilter,
    ) -> InventoryResult<Vec<InventoryRecord>>;

    /// # Errors
    ///
    /// - `NotFound` if no record has this UUID
    async fn get_by_uuid(&self, uuid: Uuid) -> InventoryResult<InventoryRecord>;

    /// Re-fetch one record from its remote and upsert it
    ///
    /// Succeeds without changes when the remote lacks the kind's extension.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record is not stored or the remote reports it absent
    async fn resync_by_uuid(&self, cancel: &CancellationToken, uuid: Uuid) -> InventoryResult<()>;

    /// Reconcile every scope of one cluster
    ///
    /// Server-scoped kinds walk the cluster's servers in order and stop at the
    /// first failure; servers already reconciled keep their new records.
    async fn sync_cluster(&self, cancel: &CancellationToken, cluster: &str) -> InventoryResult<()>;

    /// Reconcile the scope reachable through one server
    async fn sync_server(&self, cancel: &CancellationToken, server: &str) -> InventoryResult<()>;

    /// Reconcile every cluster in directory order
    async fn sync_all(&self, cancel: &CancellationToken) -> InventoryResult<()>;
}

/// Scope replaced by one reconciliation
#[derive(Debug, Clone, Copy)]
enum SyncScope<'a> {
    Cluster { cluster: &'a str },
    Server { cluster: &'a str, server: &'a str },
}

impl SyncScope<'_> {
    fn cluster(&self) -> &str {
        match self {
            Self::Cluster { cluster } | Self::Server { cluster, .. } => cluster,
        }
    }
}

/// Generic sync service, one instance per resource kind
pub struct InventorySyncService {
    kind: ResourceKind,
    repo: Arc<dyn ResourceRepository>,
    client: Arc<dyn ServerClient>,
    clusters: Arc<dyn ClusterDirectory>,
    servers: Arc<dyn ServerDirectory>,
}

impl InventorySyncService {
    /// Create a service for the kind stored in `repo`
    pub fn new(
        repo: Arc<dyn ResourceRepository>,
        client: Arc<dyn ServerClient>,
        clusters: Arc<dyn ClusterDirectory>,
        servers: Arc<dyn ServerDirectory>,
    ) -> Self {
        Self {
            kind: repo.kind(),
            repo,
            client,
            clusters,
            servers,
        }
    }

    /// Repository this service writes to
    pub fn repository(&self) -> Arc<dyn ResourceRepository> {
        Arc::clone(&self.repo)
    }

    /// Whether `endpoint` exposes this kind; kinds without an extension always do
    async fn supported(&self, cancel: &CancellationToken, endpoint: &Endpoint) -> InventoryResult<bool> {
        match self.kind.required_extension() {
            Some(extension) => {
                let present = cancellable(cancel, async {
                    Ok::<_, InventoryError>(self.client.has_extension(endpoint, extension).await)
                })
                .await?;
                if !present {
                    info!(
                        "Skipping {} on {}: extension {} not available",
                        self.kind, endpoint.name, extension
                    );
                }
                Ok(present)
            }
            None => Ok(true),
        }
    }

    async fn sync_member(&self, cancel: &CancellationToken, server: &Server) -> InventoryResult<()> {
        let Some(cluster) = server.cluster.as_deref() else {
            info!(
                "Server {} belongs to no cluster, nothing to sync for {}",
                server.name, self.kind
            );
            return Ok(());
        };

        let scope = if self.kind.is_server_scoped() {
            SyncScope::Server {
                cluster,
                server: &server.name,
            }
        } else {
            SyncScope::Cluster { cluster }
        };

        self.reconcile(cancel, &server.endpoint(), scope).await
    }

    async fn reconcile(
        &self,
        cancel: &CancellationToken,
        endpoint: &Endpoint,
        scope: SyncScope<'_>,
    ) -> InventoryResult<()> {
        if !self.supported(cancel, endpoint).await? {
            return Ok(());
        }

        let remote = cancellable(cancel, self.client.get_resources(endpoint, self.kind)).await?;
        debug!(
            "Fetched {} {} from {}",
            remote.len(),
            self.kind,
            endpoint.name
        );

        let now = Utc::now();
        let records = remote
            .into_iter()
            .map(|item| {
                let builder = InventoryRecord::builder(self.kind, scope.cluster())
                    .locator(item.locator)
                    .object(item.object)
                    .last_updated(now);
                let builder = match scope {
                    SyncScope::Server { server, .. } => builder.server(server),
                    SyncScope::Cluster { .. } => builder,
                };
                builder.build()
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let mut tx = cancellable(cancel, self.repo.begin()).await?;

        let deleted = match scope {
            SyncScope::Server { cluster, server } => {
                cancellable(cancel, tx.delete_by_server_name(cluster, server)).await
            }
            SyncScope::Cluster { cluster } => {
                cancellable(cancel, tx.delete_by_cluster_name(cluster)).await
            }
        };
        match deleted {
            Err(err) if err.is_not_found() => {}
            other => other?,
        }

        let count = records.len();
        for record in records {
            cancellable(cancel, tx.create(record)).await?;
        }

        cancellable(cancel, tx.commit()).await?;

        info!(
            "Synced {} {} from {} into cluster {}",
            count,
            self.kind,
            endpoint.name,
            scope.cluster()
        );
        Ok(())
    }

    async fn resolve_endpoint(
        &self,
        cancel: &CancellationToken,
        record: &InventoryRecord,
    ) -> InventoryResult<Endpoint> {
        if self.kind.is_server_scoped() {
            let server = record
                .server
                .as_deref()
                .ok_or(ValidationError::MissingField("server"))?;
            Ok(cancellable(cancel, self.servers.get_by_name(server))
                .await?
                .endpoint())
        } else {
            Ok(cancellable(cancel, self.clusters.get_by_name(&record.cluster))
                .await?
                .endpoint())
        }
    }
}

#[async_trait]
impl InventorySync for InventorySyncService {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn get_all_uuids_with_filter(&self, filter: &ResourceFilter) -> InventoryResult<Vec<Uuid>> {
        self.repo.get_all_uuids_with_filter(filter).await
    }

    async fn get_all_with_filter(
        &self,
        filter: &ResourceFilter,
    ) -> InventoryResult<Vec<InventoryRecord>> {
        self.repo.get_all_with_filter(filter).await
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> InventoryResult<InventoryRecord> {
        self.repo.get_by_uuid(uuid).await
    }

    async fn resync_by_uuid(&self, cancel: &CancellationToken, uuid: Uuid) -> InventoryResult<()> {
        let record = cancellable(cancel, self.repo.get_by_uuid(uuid)).await?;
        let endpoint = self.resolve_endpoint(cancel, &record).await?;

        if !self.supported(cancel, &endpoint).await? {
            return Ok(());
        }

        let remote = cancellable(
            cancel,
            self.client.get_resource(&endpoint, self.kind, &record.locator()),
        )
        .await?;

        let mut builder = InventoryRecord::builder(self.kind, record.cluster.clone())
            .locator(record.locator())
            .object(remote.object)
            .last_updated(Utc::now());
        if let Some(server) = &record.server {
            builder = builder.server(server.clone());
        }
        let refreshed = builder.build()?;

        let mut tx = cancellable(cancel, self.repo.begin()).await?;
        cancellable(cancel, tx.update_by_uuid(refreshed)).await?;
        cancellable(cancel, tx.commit()).await?;

        debug!("Resynced {} {} ({})", self.kind, record.name, uuid);
        Ok(())
    }

    async fn sync_cluster(&self, cancel: &CancellationToken, cluster: &str) -> InventoryResult<()> {
        let cluster = cancellable(cancel, self.clusters.get_by_name(cluster)).await?;

        if !self.kind.is_server_scoped() {
            return self
                .reconcile(
                    cancel,
                    &cluster.endpoint(),
                    SyncScope::Cluster {
                        cluster: &cluster.name,
                    },
                )
                .await;
        }

        let servers = cancellable(cancel, self.servers.get_all_by_cluster(&cluster.name)).await?;
        for server in &servers {
            if let Err(err) = self.sync_member(cancel, server).await {
                warn!(
                    "Sync of {} aborted at server {} in cluster {}: {}",
                    self.kind, server.name, cluster.name, err
                );
                return Err(err);
            }
        }

        Ok(())
    }

    async fn sync_server(&self, cancel: &CancellationToken, server: &str) -> InventoryResult<()> {
        let server = cancellable(cancel, self.servers.get_by_name(server)).await?;
        self.sync_member(cancel, &server).await
    }

    async fn sync_all(&self, cancel: &CancellationToken) -> InventoryResult<()> {
        let clusters = cancellable(cancel, self.clusters.get_all()).await?;

        for cluster in &clusters {
            self.sync_cluster(cancel, &cluster.name).await?;
        }

        Ok(())
    }
}
