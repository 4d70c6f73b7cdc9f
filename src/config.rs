// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fleet Configuration
//!
//! Static description of the fleet, loaded from a JSON file:
//!
//! ```json
//! {
//!   "clusters": [
//!     {
//!       "name": "c1",
//!       "connection_url": "https://10.0.0.10:8443",
//!       "servers": [
//!         { "name": "s1", "connection_url": "https://10.0.0.11:8443" }
//!       ]
//!     }
//!   ],
//!   "kinds": ["instances", "networks"]
//! }
//! ```
//!
//! `kinds` defaults to every resource kind.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::directory::StaticDirectory;
use crate::domain::{Cluster, ResourceKind, Server};
use crate::errors::{InventoryError, InventoryResult};

/// One member server of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,

    /// Base URL (e.g., "https://10.0.0.11:8443")
    pub connection_url: String,

    /// PEM certificate the server presents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

/// One cluster and its servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,

    pub connection_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

/// Whole-fleet configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,

    /// Kinds to sync and aggregate
    #[serde(default = "default_kinds")]
    pub kinds: Vec<ResourceKind>,
}

fn default_kinds() -> Vec<ResourceKind> {
    ResourceKind::ALL.to_vec()
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            clusters: Vec::new(),
            kinds: default_kinds(),
        }
    }
}

impl FleetConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> InventoryResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_json(&raw)
    }

    /// Parse and validate a JSON document
    pub fn from_json(raw: &str) -> InventoryResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| InventoryError::Configuration(format!("invalid fleet config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check names, URLs and uniqueness
    pub fn validate(&self) -> InventoryResult<()> {
        if self.clusters.is_empty() {
            return Err(InventoryError::Configuration(
                "at least one cluster is required".to_string(),
            ));
        }
        if self.kinds.is_empty() {
            return Err(InventoryError::Configuration(
                "kinds must not be empty".to_string(),
            ));
        }

        let mut clusters = HashSet::new();
        let mut servers = HashSet::new();

        for cluster in &self.clusters {
            require("cluster name", &cluster.name)?;
            require("cluster connection_url", &cluster.connection_url)?;
            if !clusters.insert(cluster.name.as_str()) {
                return Err(InventoryError::Configuration(format!(
                    "duplicate cluster {}",
                    cluster.name
                )));
            }

            for server in &cluster.servers {
                require("server name", &server.name)?;
                require("server connection_url", &server.connection_url)?;
                if !servers.insert(server.name.as_str()) {
                    return Err(InventoryError::Configuration(format!(
                        "duplicate server {}",
                        server.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Topology described by this configuration
    pub fn to_directory(&self) -> StaticDirectory {
        self.clusters
            .iter()
            .fold(StaticDirectory::new(), |directory, cluster| {
                let directory = directory.with_cluster(Cluster {
                    name: cluster.name.clone(),
                    connection_url: cluster.connection_url.clone(),
                    certificate: cluster.certificate.clone(),
                });

                cluster.servers.iter().fold(directory, |directory, server| {
                    directory.with_server(Server {
                        name: server.name.clone(),
                        cluster: Some(cluster.name.clone()),
                        connection_url: server.connection_url.clone(),
                        certificate: server.certificate.clone(),
                    })
                })
            })
    }
}

fn require(field: &str, value: &str) -> InventoryResult<()> {
    if value.trim().is_empty() {
        return Err(InventoryError::Configuration(format!("{} is empty", field)));
    }
    Ok(())
}
