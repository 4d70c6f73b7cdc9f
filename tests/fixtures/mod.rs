// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-inventory
//!
//! Provides a deterministic fleet, a scripted server client and a repository
//! that fails on demand.
//!
//! # Design Principles
//! - Fleet names are fixed constants
//! - Remote state is scripted per (endpoint, kind); nothing touches the network
//! - Fault injection wraps the real in-memory repository so commit/rollback
//!   behavior under test is the production one

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use cim_inventory::domain::{Cluster, Endpoint, InventoryRecord, ResourceKind, ResourceLocator, Server};
use cim_inventory::{
    InventoryError, InventoryResult, MemoryRepository, RemoteResource, RepositoryTransaction,
    ResourceFilter, ResourceRepository, ServerClient, StaticDirectory,
};

pub const CLUSTER_1: &str = "c1";
pub const CLUSTER_2: &str = "c2";
pub const SERVER_1: &str = "s1";
pub const SERVER_2: &str = "s2";
pub const SERVER_3: &str = "s3";
pub const STANDALONE: &str = "lone";
pub const PROJECT: &str = "default";

/// c1 = {s1, s2}, c2 = {s3}, plus one server outside any cluster
pub fn fleet_directory() -> Arc<StaticDirectory> {
    let cluster = |name: &str| Cluster {
        name: name.to_string(),
        connection_url: format!("https://{}.example.net:8443", name),
        certificate: None,
    };
    let server = |name: &str, cluster: Option<&str>| Server {
        name: name.to_string(),
        cluster: cluster.map(str::to_string),
        connection_url: format!("https://{}.example.net:8443", name),
        certificate: None,
    };

    Arc::new(
        StaticDirectory::new()
            .with_cluster(cluster(CLUSTER_1))
            .with_cluster(cluster(CLUSTER_2))
            .with_server(server(SERVER_1, Some(CLUSTER_1)))
            .with_server(server(SERVER_2, Some(CLUSTER_1)))
            .with_server(server(SERVER_3, Some(CLUSTER_2)))
            .with_server(server(STANDALONE, None)),
    )
}

/// Remote instance in the default project
pub fn remote_instance(name: &str, status: &str) -> RemoteResource {
    RemoteResource::new(
        ResourceLocator::new(name).with_project(PROJECT),
        json!({ "name": name, "status": status, "type": "container" }),
    )
}

/// Remote network in the default project
pub fn remote_network(name: &str) -> RemoteResource {
    RemoteResource::new(
        ResourceLocator::new(name).with_project(PROJECT),
        json!({ "name": name, "type": "bridge", "managed": true }),
    )
}

/// Remote storage bucket in pool `local`
pub fn remote_bucket(name: &str) -> RemoteResource {
    RemoteResource::new(
        ResourceLocator::new(name)
            .with_project(PROJECT)
            .with_parent("local"),
        json!({ "name": name }),
    )
}

/// Stored instance record as a previous sync would have left it
pub fn stored_instance(cluster: &str, server: &str, name: &str, status: &str) -> InventoryRecord {
    InventoryRecord::builder(ResourceKind::Instance, cluster)
        .server(server)
        .locator(ResourceLocator::new(name).with_project(PROJECT))
        .object(json!({ "name": name, "status": status, "type": "container" }))
        .build()
        .expect("valid instance fixture")
}

/// Commit `records` into `repo` in one transaction
pub async fn seed(repo: &dyn ResourceRepository, records: Vec<InventoryRecord>) {
    let mut tx = repo.begin().await.expect("begin");
    for record in records {
        tx.create(record).await.expect("seed record");
    }
    tx.commit().await.expect("commit seed");
}

/// Every stored record, sorted by name
pub async fn all_records(repo: &dyn ResourceRepository) -> Vec<InventoryRecord> {
    let mut records = repo
        .get_all_with_filter(&ResourceFilter::new())
        .await
        .expect("read records");
    records.sort_by(|a, b| (&a.server, &a.name).cmp(&(&b.server, &b.name)));
    records
}

/// Server client answering from scripted per-endpoint state
#[derive(Default)]
pub struct FakeServerClient {
    resources: Mutex<HashMap<(String, ResourceKind), Vec<RemoteResource>>>,
    failing: Mutex<HashSet<(String, ResourceKind)>>,
    missing_extensions: Mutex<HashSet<(String, String)>>,
    fetches: AtomicUsize,
}

impl FakeServerClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the full list `endpoint` reports for `kind`
    pub fn set_resources(&self, endpoint: &str, kind: ResourceKind, items: Vec<RemoteResource>) {
        self.resources
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), kind), items);
    }

    /// Make every fetch of `kind` from `endpoint` fail with a transport error
    pub fn fail_fetch(&self, endpoint: &str, kind: ResourceKind) {
        self.failing
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), kind));
    }

    /// Stop advertising `extension` on `endpoint`
    pub fn without_extension(&self, endpoint: &str, extension: &str) {
        self.missing_extensions
            .lock()
            .unwrap()
            .insert((endpoint.to_string(), extension.to_string()));
    }

    /// Number of list and point fetches served so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_failure(&self, endpoint: &Endpoint, kind: ResourceKind) -> InventoryResult<()> {
        if self
            .failing
            .lock()
            .unwrap()
            .contains(&(endpoint.name.clone(), kind))
        {
            return Err(InventoryError::Transport(format!(
                "{}: connection refused",
                endpoint.connection_url
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ServerClient for FakeServerClient {
    async fn has_extension(&self, endpoint: &Endpoint, name: &str) -> bool {
        !self
            .missing_extensions
            .lock()
            .unwrap()
            .contains(&(endpoint.name.clone(), name.to_string()))
    }

    async fn get_resources(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
    ) -> InventoryResult<Vec<RemoteResource>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure(endpoint, kind)?;

        Ok(self
            .resources
            .lock()
            .unwrap()
            .get(&(endpoint.name.clone(), kind))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_resource(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
        locator: &ResourceLocator,
    ) -> InventoryResult<RemoteResource> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure(endpoint, kind)?;

        self.resources
            .lock()
            .unwrap()
            .get(&(endpoint.name.clone(), kind))
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.locator.name == locator.name)
                    .cloned()
            })
            .ok_or_else(|| InventoryError::NotFound(format!("{} {}", kind, locator.name)))
    }
}

/// In-memory repository whose transactions fail on demand
pub struct FailingRepository {
    inner: MemoryRepository,
    fail_on_create: usize,
    scoped_delete_error: Option<fn(String) -> InventoryError>,
    cancel_on_create: Option<(usize, CancellationToken)>,
}

impl FailingRepository {
    /// `fail_on_create` is 1-based and counted per transaction; 0 never fails
    pub fn new(kind: ResourceKind, fail_on_create: usize) -> Self {
        Self {
            inner: MemoryRepository::new(kind),
            fail_on_create,
            scoped_delete_error: None,
            cancel_on_create: None,
        }
    }

    /// Scoped deletes still apply, then report `error`
    pub fn with_scoped_delete_error(mut self, error: fn(String) -> InventoryError) -> Self {
        self.scoped_delete_error = Some(error);
        self
    }

    /// Fire `cancel` while the nth `create` of a transaction is in flight
    pub fn cancel_on_create(mut self, nth: usize, cancel: CancellationToken) -> Self {
        self.cancel_on_create = Some((nth, cancel));
        self
    }

    /// The wrapped repository, sharing state
    pub fn inner(&self) -> MemoryRepository {
        self.inner.clone()
    }
}

#[async_trait]
impl ResourceRepository for FailingRepository {
    fn kind(&self) -> ResourceKind {
        self.inner.kind()
    }

    async fn get_all_with_filter(
        &self,
        filter: &ResourceFilter,
    ) -> InventoryResult<Vec<InventoryRecord>> {
        self.inner.get_all_with_filter(filter).await
    }

    async fn get_all_uuids_with_filter(&self, filter: &ResourceFilter) -> InventoryResult<Vec<Uuid>> {
        self.inner.get_all_uuids_with_filter(filter).await
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> InventoryResult<InventoryRecord> {
        self.inner.get_by_uuid(uuid).await
    }

    async fn begin(&self) -> InventoryResult<Box<dyn RepositoryTransaction>> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin().await?,
            creates: 0,
            fail_on_create: self.fail_on_create,
            scoped_delete_error: self.scoped_delete_error,
            cancel_on_create: self.cancel_on_create.clone(),
        }))
    }
}

struct FailingTransaction {
    inner: Box<dyn RepositoryTransaction>,
    creates: usize,
    fail_on_create: usize,
    scoped_delete_error: Option<fn(String) -> InventoryError>,
    cancel_on_create: Option<(usize, CancellationToken)>,
}

impl FailingTransaction {
    fn scoped_delete_result(&self, scope: String) -> InventoryResult<()> {
        match self.scoped_delete_error {
            Some(error) => Err(error(scope)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RepositoryTransaction for FailingTransaction {
    async fn create(&mut self, record: InventoryRecord) -> InventoryResult<InventoryRecord> {
        self.creates += 1;
        if self.creates == self.fail_on_create {
            return Err(InventoryError::Storage(format!(
                "injected failure on create #{}",
                self.creates
            )));
        }
        if let Some((nth, cancel)) = &self.cancel_on_create {
            if self.creates == *nth {
                cancel.cancel();
                std::future::pending::<()>().await;
            }
        }
        self.inner.create(record).await
    }

    async fn update_by_uuid(&mut self, record: InventoryRecord) -> InventoryResult<InventoryRecord> {
        self.inner.update_by_uuid(record).await
    }

    async fn delete_by_uuid(&mut self, uuid: Uuid) -> InventoryResult<()> {
        self.inner.delete_by_uuid(uuid).await
    }

    async fn delete_by_cluster_name(&mut self, cluster: &str) -> InventoryResult<()> {
        self.inner.delete_by_cluster_name(cluster).await?;
        self.scoped_delete_result(format!("records of cluster {}", cluster))
    }

    async fn delete_by_server_name(&mut self, cluster: &str, server: &str) -> InventoryResult<()> {
        self.inner.delete_by_server_name(cluster, server).await?;
        self.scoped_delete_result(format!("records of server {}/{}", cluster, server))
    }

    async fn commit(&mut self) -> InventoryResult<()> {
        self.inner.commit().await
    }
}
