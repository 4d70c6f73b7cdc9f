// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Repository Abstraction
//!
//! One repository per resource kind. Reads go straight to the repository;
//! every write happens inside a [`RepositoryTransaction`].
//!
//! # Transaction Semantics
//!
//! ```text
//! begin() ──> guard ──> delete/create/update (staged) ──> commit() ──> visible
//!               │
//!               └── dropped without commit (error, `?`, cancellation) ──> discarded
//! ```
//!
//! Implementations must guarantee that readers observe either the state before
//! the transaction or the state after its commit, never a partial write set.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{InventoryRecord, ResourceKind};
use crate::errors::InventoryResult;
use crate::filter::ResourceFilter;

pub mod memory;

pub use memory::MemoryRepository;

/// Storage for the records of one resource kind
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Kind of record stored here
    fn kind(&self) -> ResourceKind;

    /// All records matching `filter`
    async fn get_all_with_filter(
        &self,
        filter: &ResourceFilter,
    ) -> InventoryResult<Vec<InventoryRecord>>;

    /// UUIDs of all records matching `filter`
    async fn get_all_uuids_with_filter(&self, filter: &ResourceFilter) -> InventoryResult<Vec<Uuid>>;

    /// Point read
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this UUID
    async fn get_by_uuid(&self, uuid: Uuid) -> InventoryResult<InventoryRecord>;

    /// Open a transaction
    ///
    /// The returned guard discards all of its writes when dropped uncommitted.
    async fn begin(&self) -> InventoryResult<Box<dyn RepositoryTransaction>>;
}

/// Scoped write access to a repository
#[async_trait]
pub trait RepositoryTransaction: Send {
    /// Insert a new record, assigning its surrogate ID
    ///
    /// # Errors
    ///
    /// - `Validation` if the record violates its invariants
    /// - `Conflict` if a record with the same UUID exists
    async fn create(&mut self, record: InventoryRecord) -> InventoryResult<InventoryRecord>;

    /// Replace the record with the same UUID, inserting it if absent
    async fn update_by_uuid(&mut self, record: InventoryRecord) -> InventoryResult<InventoryRecord>;

    /// Remove one record
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this UUID
    async fn delete_by_uuid(&mut self, uuid: Uuid) -> InventoryResult<()>;

    /// Remove every record of a cluster; succeeds when nothing matched
    async fn delete_by_cluster_name(&mut self, cluster: &str) -> InventoryResult<()>;

    /// Remove every record of one server; succeeds when nothing matched
    async fn delete_by_server_name(&mut self, cluster: &str, server: &str) -> InventoryResult<()>;

    /// Publish the staged writes
    ///
    /// The transaction must not be used after a successful commit.
    async fn commit(&mut self) -> InventoryResult<()>;
}
