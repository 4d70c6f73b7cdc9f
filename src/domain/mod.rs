// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory Domain Models
//!
//! - [`ResourceKind`] - taxonomy of mirrored resources and their scope layouts
//! - [`InventoryRecord`] - one mirrored resource with derived identity
//! - [`ResourceLocator`] - address of a resource inside its cluster
//! - [`Cluster`], [`Server`], [`Endpoint`] - fleet topology
//! - [`ValidationError`] - record invariants

pub mod inventory_record;
pub mod invariants;
pub mod resource_kind;
pub mod topology;

pub use inventory_record::{InventoryRecord, InventoryRecordBuilder, ResourceLocator};
pub use invariants::{ScopeFields, ValidationError, ValidationResult};
pub use resource_kind::{ParentKind, ResourceKind, ScopeLayout};
pub use topology::{Cluster, Endpoint, Server};
