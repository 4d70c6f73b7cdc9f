// Copyright (c) 2025 - Cowboy AI, Inc.
//! Server Capability Client
//!
//! The narrow contract the inventory needs from a remote server: capability
//! probing, full-list fetch per kind and point fetch by name. The wire format
//! is the implementation's business; see `adapters::incus` for the HTTP one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Endpoint, ResourceKind, ResourceLocator};
use crate::errors::InventoryResult;

/// One resource as reported by a remote server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResource {
    #[serde(flatten)]
    pub locator: ResourceLocator,

    /// Full remote payload
    pub object: serde_json::Value,
}

impl RemoteResource {
    pub fn new(locator: ResourceLocator, object: serde_json::Value) -> Self {
        Self { locator, object }
    }
}

/// Remote API of one server or cluster
#[async_trait]
pub trait ServerClient: Send + Sync {
    /// Whether the remote advertises the API extension `name`
    ///
    /// Never fails: an unreachable or unparseable remote reports `false`.
    async fn has_extension(&self, endpoint: &Endpoint, name: &str) -> bool;

    /// Every resource of `kind` visible through `endpoint`, across all projects
    ///
    /// For server-scoped kinds only resources located on the endpoint's server
    /// are returned.
    ///
    /// # Errors
    ///
    /// - `Transport` if the remote call fails
    async fn get_resources(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
    ) -> InventoryResult<Vec<RemoteResource>>;

    /// One resource of `kind` addressed by `locator`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the remote reports the resource absent
    /// - `Transport` for any other failure
    async fn get_resource(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
        locator: &ResourceLocator,
    ) -> InventoryResult<RemoteResource>;
}
