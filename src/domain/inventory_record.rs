// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory Record Entity
//!
//! One mirrored remote resource. Identity is never supplied by callers: the
//! builder derives the UUID from the scoping fields, and [`InventoryRecord::validate`]
//! re-derives it on every pass so a scoping field changed without re-deriving
//! is caught.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invariants::{validate_identity, validate_scope, ScopeFields, ValidationResult};
use super::{ResourceKind, ValidationError};
use crate::identity::derive_uuid;

/// Address of a resource inside its cluster, as understood by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocator {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub project: Option<String>,

    /// Network or storage pool the resource is nested under
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,

    /// Storage volume type (custom, container, virtual-machine, image)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volume_type: Option<String>,

    pub name: String,
}

impl ResourceLocator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: None,
            parent: None,
            volume_type: None,
            name: name.into(),
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_volume_type(mut self, volume_type: impl Into<String>) -> Self {
        self.volume_type = Some(volume_type.into());
        self
    }
}

/// Mirrored remote resource
///
/// # Invariants
/// - `uuid` equals the UUID derived from `(cluster, server, project, parent, volume_type, name)`
/// - Scoping fields match the layout of `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Storage-assigned surrogate key, not part of identity
    #[serde(default)]
    pub id: i64,

    pub uuid: Uuid,

    pub kind: ResourceKind,

    pub cluster: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub project: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volume_type: Option<String>,

    pub name: String,

    /// Payload exactly as reported by the remote server
    pub object: serde_json::Value,

    /// Time of the sync that last wrote this record
    pub last_updated: DateTime<Utc>,
}

impl InventoryRecord {
    /// Start building a record of `kind` in `cluster`
    pub fn builder(kind: ResourceKind, cluster: impl Into<String>) -> InventoryRecordBuilder {
        InventoryRecordBuilder::new(kind, cluster)
    }

    /// Scoping fields in identity order
    pub fn scope_fields(&self) -> ScopeFields<'_> {
        ScopeFields {
            cluster: &self.cluster,
            server: self.server.as_deref(),
            project: self.project.as_deref(),
            parent: self.parent.as_deref(),
            volume_type: self.volume_type.as_deref(),
            name: &self.name,
        }
    }

    /// UUID derived from the record's current fields
    pub fn derive_uuid(&self) -> Uuid {
        let f = self.scope_fields();
        derive_uuid(&[
            f.cluster,
            f.server.unwrap_or_default(),
            f.project.unwrap_or_default(),
            f.parent.unwrap_or_default(),
            f.volume_type.unwrap_or_default(),
            f.name,
        ])
    }

    /// Check required fields, then identity
    pub fn validate(&self) -> ValidationResult {
        validate_scope(self.kind, &self.scope_fields())?;
        validate_identity(self.uuid, self.derive_uuid())
    }

    /// Nesting path below the cluster, used by the aggregate snapshot
    pub fn scope_path(&self) -> Vec<&str> {
        [
            self.server.as_deref(),
            self.project.as_deref(),
            self.parent.as_deref(),
            self.volume_type.as_deref(),
            Some(self.name.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect()
    }

    /// Address used to fetch this record again from its remote
    pub fn locator(&self) -> ResourceLocator {
        ResourceLocator {
            project: self.project.clone(),
            parent: self.parent.clone(),
            volume_type: self.volume_type.clone(),
            name: self.name.clone(),
        }
    }
}

/// Builder for [`InventoryRecord`]
///
/// Fields outside the kind's layout are dropped, so a remote payload that
/// carries e.g. a project for a cluster-wide kind still yields a valid record.
#[derive(Debug, Clone)]
pub struct InventoryRecordBuilder {
    kind: ResourceKind,
    cluster: String,
    server: Option<String>,
    locator: ResourceLocator,
    object: serde_json::Value,
    last_updated: DateTime<Utc>,
}

impl InventoryRecordBuilder {
    fn new(kind: ResourceKind, cluster: impl Into<String>) -> Self {
        Self {
            kind,
            cluster: cluster.into(),
            server: None,
            locator: ResourceLocator::new(""),
            object: serde_json::Value::Null,
            last_updated: Utc::now(),
        }
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn locator(mut self, locator: ResourceLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = last_updated;
        self
    }

    /// Derive identity and validate
    pub fn build(self) -> Result<InventoryRecord, ValidationError> {
        let layout = self.kind.layout();
        let keep = |used: bool, value: Option<String>| value.filter(|_| used);

        let mut record = InventoryRecord {
            id: 0,
            uuid: Uuid::nil(),
            kind: self.kind,
            cluster: self.cluster,
            server: keep(layout.server, self.server),
            project: keep(layout.project, self.locator.project),
            parent: keep(layout.parent.is_some(), self.locator.parent),
            volume_type: keep(layout.volume_type, self.locator.volume_type),
            name: self.locator.name,
            object: self.object,
            last_updated: self.last_updated,
        };
        record.uuid = record.derive_uuid();
        record.validate()?;

        Ok(record)
    }
}
