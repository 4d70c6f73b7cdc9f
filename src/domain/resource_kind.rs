// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory Resource Kind Taxonomy
//!
//! Every category of remote-managed object that the inventory mirrors, together
//! with the scope layout that makes up its identity and the remote extension it
//! depends on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Resource kinds mirrored from the fleet
///
/// The declaration order is the order kinds are synced and aggregated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "images")]
    Image,
    #[serde(rename = "instances")]
    Instance,
    #[serde(rename = "networks")]
    Network,
    #[serde(rename = "network_acls")]
    NetworkAcl,
    #[serde(rename = "network_address_sets")]
    NetworkAddressSet,
    #[serde(rename = "network_forwards")]
    NetworkForward,
    #[serde(rename = "network_integrations")]
    NetworkIntegration,
    #[serde(rename = "network_load_balancers")]
    NetworkLoadBalancer,
    #[serde(rename = "network_peers")]
    NetworkPeer,
    #[serde(rename = "network_zones")]
    NetworkZone,
    #[serde(rename = "profiles")]
    Profile,
    #[serde(rename = "projects")]
    Project,
    #[serde(rename = "storage_buckets")]
    StorageBucket,
    #[serde(rename = "storage_pools")]
    StoragePool,
    #[serde(rename = "storage_volumes")]
    StorageVolume,
}

/// Kind of the named parent a record is nested under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Network,
    StoragePool,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::StoragePool => "storage_pool",
        }
    }
}

/// Which scoping fields are part of a kind's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeLayout {
    pub server: bool,
    pub project: bool,
    pub parent: Option<ParentKind>,
    pub volume_type: bool,
}

impl ScopeLayout {
    const fn new(server: bool, project: bool, parent: Option<ParentKind>, volume_type: bool) -> Self {
        Self {
            server,
            project,
            parent,
            volume_type,
        }
    }
}

impl ResourceKind {
    /// All kinds in sync order
    pub const ALL: [ResourceKind; 15] = [
        Self::Image,
        Self::Instance,
        Self::Network,
        Self::NetworkAcl,
        Self::NetworkAddressSet,
        Self::NetworkForward,
        Self::NetworkIntegration,
        Self::NetworkLoadBalancer,
        Self::NetworkPeer,
        Self::NetworkZone,
        Self::Profile,
        Self::Project,
        Self::StorageBucket,
        Self::StoragePool,
        Self::StorageVolume,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Instance => "instances",
            Self::Network => "networks",
            Self::NetworkAcl => "network_acls",
            Self::NetworkAddressSet => "network_address_sets",
            Self::NetworkForward => "network_forwards",
            Self::NetworkIntegration => "network_integrations",
            Self::NetworkLoadBalancer => "network_load_balancers",
            Self::NetworkPeer => "network_peers",
            Self::NetworkZone => "network_zones",
            Self::Profile => "profiles",
            Self::Project => "projects",
            Self::StorageBucket => "storage_buckets",
            Self::StoragePool => "storage_pools",
            Self::StorageVolume => "storage_volumes",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Instance => "Instance",
            Self::Network => "Network",
            Self::NetworkAcl => "Network ACL",
            Self::NetworkAddressSet => "Network Address Set",
            Self::NetworkForward => "Network Forward",
            Self::NetworkIntegration => "Network Integration",
            Self::NetworkLoadBalancer => "Network Load Balancer",
            Self::NetworkPeer => "Network Peer",
            Self::NetworkZone => "Network Zone",
            Self::Profile => "Profile",
            Self::Project => "Project",
            Self::StorageBucket => "Storage Bucket",
            Self::StoragePool => "Storage Pool",
            Self::StorageVolume => "Storage Volume",
        }
    }

    /// Scoping fields that make up this kind's identity
    pub fn layout(&self) -> ScopeLayout {
        use ParentKind::*;

        match self {
            Self::Instance => ScopeLayout::new(true, true, None, false),
            Self::StorageBucket => ScopeLayout::new(true, true, Some(StoragePool), false),
            Self::StorageVolume => ScopeLayout::new(true, true, Some(StoragePool), true),
            Self::Image
            | Self::Network
            | Self::NetworkAcl
            | Self::NetworkAddressSet
            | Self::NetworkZone
            | Self::Profile => ScopeLayout::new(false, true, None, false),
            Self::NetworkForward | Self::NetworkLoadBalancer | Self::NetworkPeer => {
                ScopeLayout::new(false, false, Some(Network), false)
            }
            Self::NetworkIntegration | Self::Project | Self::StoragePool => {
                ScopeLayout::new(false, false, None, false)
            }
        }
    }

    /// API extension a remote server must advertise to expose this kind
    pub fn required_extension(&self) -> Option<&'static str> {
        match self {
            Self::NetworkAddressSet => Some("network_address_set"),
            Self::NetworkForward => Some("network_forward"),
            Self::NetworkIntegration => Some("network_integrations"),
            Self::NetworkLoadBalancer => Some("network_load_balancer"),
            Self::NetworkPeer => Some("network_peer"),
            Self::NetworkZone => Some("network_dns"),
            Self::StorageBucket => Some("storage_buckets"),
            _ => None,
        }
    }

    /// Whether records of this kind belong to a single server
    ///
    /// Kinds that are not server-scoped are reconciled per cluster.
    pub fn is_server_scoped(&self) -> bool {
        self.layout().server
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().replace('-', "_").as_str() {
            "images" | "image" => Self::Image,
            "instances" | "instance" => Self::Instance,
            "networks" | "network" => Self::Network,
            "network_acls" | "network_acl" => Self::NetworkAcl,
            "network_address_sets" | "network_address_set" => Self::NetworkAddressSet,
            "network_forwards" | "network_forward" => Self::NetworkForward,
            "network_integrations" | "network_integration" => Self::NetworkIntegration,
            "network_load_balancers" | "network_load_balancer" => Self::NetworkLoadBalancer,
            "network_peers" | "network_peer" => Self::NetworkPeer,
            "network_zones" | "network_zone" => Self::NetworkZone,
            "profiles" | "profile" => Self::Profile,
            "projects" | "project" => Self::Project,
            "storage_buckets" | "storage_bucket" => Self::StorageBucket,
            "storage_pools" | "storage_pool" => Self::StoragePool,
            "storage_volumes" | "storage_volume" => Self::StorageVolume,
            _ => return Err(ValidationError::UnknownKind(s.to_string())),
        };

        Ok(kind)
    }
}
