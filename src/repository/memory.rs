// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory repository
//!
//! Records live in a `BTreeMap` behind a tokio `RwLock`. A transaction holds
//! the write lock for its whole lifetime and stages its writes on a copy of
//! the map; commit swaps the copy in. Readers therefore wait for an open
//! transaction and then see its committed result, or the untouched map if it
//! was dropped.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{RepositoryTransaction, ResourceRepository};
use crate::domain::{InventoryRecord, ResourceKind};
use crate::errors::{InventoryError, InventoryResult};
use crate::expression::{ExpressionMatcher, PathEqualityMatcher};
use crate::filter::ResourceFilter;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    records: BTreeMap<Uuid, InventoryRecord>,
    last_id: i64,
}

/// Repository keeping one kind's records in process memory
#[derive(Clone)]
pub struct MemoryRepository {
    kind: ResourceKind,
    state: Arc<RwLock<MemoryState>>,
    matcher: Arc<dyn ExpressionMatcher>,
}

impl MemoryRepository {
    /// Create an empty repository using [`PathEqualityMatcher`] for expressions
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            state: Arc::new(RwLock::new(MemoryState::default())),
            matcher: Arc::new(PathEqualityMatcher::new()),
        }
    }

    /// Use a different expression matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn ExpressionMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn select(&self, filter: &ResourceFilter) -> InventoryResult<Vec<InventoryRecord>> {
        let state = self.state.read().await;
        let mut selected = Vec::new();

        for record in state.records.values() {
            if filter.matches(record, self.matcher.as_ref())? {
                selected.push(record.clone());
            }
        }

        Ok(selected)
    }
}

#[async_trait]
impl ResourceRepository for MemoryRepository {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn get_all_with_filter(
        &self,
        filter: &ResourceFilter,
    ) -> InventoryResult<Vec<InventoryRecord>> {
        self.select(filter).await
    }

    async fn get_all_uuids_with_filter(&self, filter: &ResourceFilter) -> InventoryResult<Vec<Uuid>> {
        Ok(self
            .select(filter)
            .await?
            .into_iter()
            .map(|record| record.uuid)
            .collect())
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> InventoryResult<InventoryRecord> {
        self.state
            .read()
            .await
            .records
            .get(&uuid)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("{} {}", self.kind, uuid)))
    }

    async fn begin(&self) -> InventoryResult<Box<dyn RepositoryTransaction>> {
        let guard = Arc::clone(&self.state).write_owned().await;
        let staged = guard.clone();

        Ok(Box::new(MemoryTransaction {
            kind: self.kind,
            guard,
            staged,
            committed: false,
        }))
    }
}

struct MemoryTransaction {
    kind: ResourceKind,
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged: MemoryState,
    committed: bool,
}

impl MemoryTransaction {
    fn staged(&mut self) -> InventoryResult<&mut MemoryState> {
        if self.committed {
            return Err(InventoryError::Storage(
                "transaction already committed".to_string(),
            ));
        }
        Ok(&mut self.staged)
    }

    fn check(&self, record: &InventoryRecord) -> InventoryResult<()> {
        if record.kind != self.kind {
            return Err(InventoryError::Storage(format!(
                "{} record cannot be stored in the {} repository",
                record.kind, self.kind
            )));
        }
        record.validate()?;
        Ok(())
    }
}

#[async_trait]
impl RepositoryTransaction for MemoryTransaction {
    async fn create(&mut self, mut record: InventoryRecord) -> InventoryResult<InventoryRecord> {
        self.check(&record)?;
        let state = self.staged()?;

        if state.records.contains_key(&record.uuid) {
            return Err(InventoryError::Conflict(format!(
                "{} {} already exists",
                record.kind, record.uuid
            )));
        }

        state.last_id += 1;
        record.id = state.last_id;
        state.records.insert(record.uuid, record.clone());

        Ok(record)
    }

    async fn update_by_uuid(&mut self, mut record: InventoryRecord) -> InventoryResult<InventoryRecord> {
        self.check(&record)?;
        let state = self.staged()?;

        record.id = match state.records.get(&record.uuid) {
            Some(existing) => existing.id,
            None => {
                state.last_id += 1;
                state.last_id
            }
        };
        state.records.insert(record.uuid, record.clone());

        Ok(record)
    }

    async fn delete_by_uuid(&mut self, uuid: Uuid) -> InventoryResult<()> {
        let kind = self.kind;
        self.staged()?
            .records
            .remove(&uuid)
            .map(|_| ())
            .ok_or_else(|| InventoryError::NotFound(format!("{} {}", kind, uuid)))
    }

    async fn delete_by_cluster_name(&mut self, cluster: &str) -> InventoryResult<()> {
        self.staged()?
            .records
            .retain(|_, record| record.cluster != cluster);
        Ok(())
    }

    async fn delete_by_server_name(&mut self, cluster: &str, server: &str) -> InventoryResult<()> {
        self.staged()?.records.retain(|_, record| {
            record.cluster != cluster || record.server.as_deref() != Some(server)
        });
        Ok(())
    }

    async fn commit(&mut self) -> InventoryResult<()> {
        let staged = std::mem::take(self.staged()?);
        *self.guard = staged;
        self.committed = true;

        debug!(
            "Committed {} transaction ({} records)",
            self.kind,
            self.guard.records.len()
        );
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.committed {
            debug!("Rolled back uncommitted {} transaction", self.kind);
        }
    }
}
