// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fleet inventory for the Composable Information Machine
//!
//! Mirrors the resources of remote virtualization hosts into per-kind
//! repositories with deterministic identity, and composes fleet-wide
//! snapshots from them.
//!
//! - [`domain`] - resource kinds, records, topology and invariants
//! - [`identity`] - name-based UUID derivation
//! - [`filter`] - per-kind query model and its canonical form
//! - [`client`], [`repository`], [`directory`] - ports, with in-memory implementations
//! - [`service`] - sync, fleet fan-out and aggregation
//! - [`adapters`] - Incus REST client (feature `incus`)

pub mod adapters;
pub mod client;
pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod expression;
pub mod filter;
pub mod identity;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use client::{RemoteResource, ServerClient};
pub use config::{ClusterConfig, FleetConfig, ServerConfig};
pub use directory::{ClusterDirectory, ServerDirectory, StaticDirectory};
pub use domain::{InventoryRecord, ResourceKind, ResourceLocator, ValidationError};
pub use errors::{InventoryError, InventoryResult};
pub use filter::ResourceFilter;
pub use identity::derive_uuid;
pub use repository::{MemoryRepository, RepositoryTransaction, ResourceRepository};
pub use service::{
    AggregateFilter, AggregationService, FleetInventory, InventoryAggregate, InventorySync,
    InventorySyncService,
};
