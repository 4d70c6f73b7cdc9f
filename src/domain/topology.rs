// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fleet topology: clusters, their member servers, and how to reach them

use serde::{Deserialize, Serialize};

/// Connection details for one remote API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Server or cluster name the endpoint belongs to
    pub name: String,

    /// Base URL (e.g., "https://10.0.0.10:8443")
    pub connection_url: String,

    /// PEM certificate the remote presents, pinned when set
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub certificate: Option<String>,
}

/// Named group of servers managed as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub connection_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub certificate: Option<String>,
}

impl Cluster {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            name: self.name.clone(),
            connection_url: self.connection_url.clone(),
            certificate: self.certificate.clone(),
        }
    }
}

/// One remote compute host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,

    /// Cluster membership; standalone servers have none
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cluster: Option<String>,

    pub connection_url: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub certificate: Option<String>,
}

impl Server {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            name: self.name.clone(),
            connection_url: self.connection_url.clone(),
            certificate: self.certificate.clone(),
        }
    }
}
