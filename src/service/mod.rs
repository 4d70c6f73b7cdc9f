// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Inventory Management
//!
//! This module provides the application services that pull resource state
//! from remote servers, reconcile it into the repositories and compose
//! fleet-wide read views.
//!
//! # Architecture
//!
//! ```text
//! sync_all
//!     ↓
//! Cluster Directory (every cluster)
//!     ↓
//! Server Directory (every server of the cluster)
//!     ↓
//! Per-kind Sync Service: has_extension → get_resources → transaction
//!     ↓
//! Resource Repository (delete scope + create, one commit)
//!
//! AggregationService ← per-kind filtered reads (no remote calls)
//! ```
//!
//! # Design Principles
//!
//! 1. **Transaction Boundaries**: one reconciliation is one transaction
//! 2. **Sequential Fan-out**: clusters, servers and kinds are walked in order,
//!    aborting on the first error
//! 3. **Cancellation**: every remote call and storage operation observes the
//!    caller's [`CancellationToken`]
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_inventory::service::FleetInventory;
//! use tokio_util::sync::CancellationToken;
//!
//! let fleet = FleetInventory::in_memory(ResourceKind::ALL, client, directory.clone(), directory);
//! fleet.sync_all(&CancellationToken::new()).await?;
//!
//! let snapshot = fleet.aggregation().get_all_with_filter(&AggregateFilter::new()).await?;
//! ```

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::errors::{InventoryError, InventoryResult};

pub mod aggregate;
pub mod fleet;
pub mod sync;

pub use aggregate::{AggregateFilter, AggregationService, InventoryAggregate, ScopeNode, ScopeTree};
pub use fleet::FleetInventory;
pub use sync::{InventorySync, InventorySyncService};

/// Run `operation` unless `cancel` fires first
///
/// A token that is already cancelled wins without polling `operation`.
pub async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> InventoryResult<T>
where
    F: Future<Output = InventoryResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(InventoryError::Cancelled),
        result = operation => result,
    }
}
