// Copyright (c) 2025 - Cowboy AI, Inc.

//! Incus REST Client Adapter
//!
//! Implements [`ServerClient`] against the Incus REST API.
//!
//! # Endpoints
//!
//! ```text
//! has_extension          = GET /1.0                     (metadata.api_extensions)
//! get_resources(kind)    = GET /1.0/<collection>?recursion=1&all-projects=true
//!   network children     = GET /1.0/networks/<net>/{forwards,load-balancers,peers}?recursion=1
//!   pool children        = GET /1.0/storage-pools/<pool>/{buckets,volumes}?recursion=1&all-projects=true
//! get_resource(locator)  = GET /1.0/<collection>/<name>?project=<p>&target=<server>
//! unlocated owner        = GET /1.0/cluster, GET /1.0/cluster/members
//! ```
//!
//! Items of server-scoped kinds without a location (remote storage pools such
//! as ceph) are reported by the cluster member with the lowest name only.
//!
//! Every response is wrapped in the Incus envelope
//! `{"type": "sync"|"error", "metadata": ..., "error": "...", "error_code": N}`;
//! error code 404 maps to `NotFound`, any other failure to `Transport`.
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_inventory::adapters::{IncusClient, IncusClientConfig};
//! use cim_inventory::client::ServerClient;
//! use cim_inventory::domain::{Endpoint, ResourceKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = IncusClient::new(IncusClientConfig::default())?;
//!     let endpoint = Endpoint {
//!         name: "s1".to_string(),
//!         connection_url: "https://10.0.0.11:8443".to_string(),
//!         certificate: None,
//!     };
//!
//!     let instances = client.get_resources(&endpoint, ResourceKind::Instance).await?;
//!     println!("{} instances", instances.len());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::{RemoteResource, ServerClient};
use crate::domain::{Endpoint, ResourceKind, ResourceLocator, ValidationError};
use crate::errors::{InventoryError, InventoryResult};

/// Configuration for Incus connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncusClientConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// PEM client certificate presented to every remote
    #[serde(default)]
    pub client_certificate_path: Option<PathBuf>,

    /// PEM private key matching `client_certificate_path`
    #[serde(default)]
    pub client_key_path: Option<PathBuf>,

    /// Skip server certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout() -> u64 {
    30
}

impl Default for IncusClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            client_certificate_path: None,
            client_key_path: None,
            accept_invalid_certs: false,
        }
    }
}

/// Incus response envelope
#[derive(Debug, Clone, Deserialize)]
struct IncusResponse {
    #[serde(rename = "type", default)]
    response_type: String,

    #[serde(default)]
    metadata: serde_json::Value,

    #[serde(default)]
    error: String,

    #[serde(default)]
    error_code: u16,
}

impl IncusResponse {
    fn into_metadata(self, status: StatusCode, path: &str) -> InventoryResult<serde_json::Value> {
        if self.response_type != "error" && status.is_success() {
            return Ok(self.metadata);
        }

        let message = if self.error.is_empty() {
            status.to_string()
        } else {
            self.error
        };

        if self.error_code == 404 || status == StatusCode::NOT_FOUND {
            Err(InventoryError::NotFound(format!("{}: {}", path, message)))
        } else {
            Err(InventoryError::Transport(format!("{}: {}", path, message)))
        }
    }
}

/// [`ServerClient`] speaking the Incus REST API
pub struct IncusClient {
    config: IncusClientConfig,
    identity: Option<Identity>,
    clients: Mutex<HashMap<String, Client>>,
}

impl IncusClient {
    /// Create a client, loading the client identity if configured
    pub fn new(config: IncusClientConfig) -> InventoryResult<Self> {
        let identity = match (&config.client_certificate_path, &config.client_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!("Loading Incus client certificate from {}", cert_path.display());
                let mut pem = read_pem(cert_path)?;
                pem.extend(read_pem(key_path)?);
                Some(Identity::from_pem(&pem).map_err(|e| {
                    InventoryError::Configuration(format!("invalid client identity: {}", e))
                })?)
            }
            (None, None) => None,
            _ => {
                return Err(InventoryError::Configuration(
                    "client certificate and key must be configured together".to_string(),
                ))
            }
        };

        Ok(Self {
            config,
            identity,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// HTTP client for `endpoint`, pinning its certificate when set
    fn client_for(&self, endpoint: &Endpoint) -> InventoryResult<Client> {
        let key = endpoint.certificate.as_deref().unwrap_or_default().to_string();

        let mut clients = self
            .clients
            .lock()
            .map_err(|_| InventoryError::Transport("client cache poisoned".to_string()))?;
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .danger_accept_invalid_certs(self.config.accept_invalid_certs);

        if let Some(identity) = &self.identity {
            builder = builder.identity(identity.clone());
        }
        if let Some(pem) = &endpoint.certificate {
            let certificate = Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                InventoryError::Configuration(format!(
                    "invalid certificate for {}: {}",
                    endpoint.name, e
                ))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder.build().map_err(|e| {
            InventoryError::Transport(format!("Failed to create HTTP client: {}", e))
        })?;
        clients.insert(key, client.clone());

        Ok(client)
    }

    async fn get(
        &self,
        endpoint: &Endpoint,
        path: &str,
        query: &[(&str, &str)],
    ) -> InventoryResult<serde_json::Value> {
        let url = format!("{}{}", endpoint.connection_url.trim_end_matches('/'), path);
        debug!("GET {} ({})", url, endpoint.name);

        let response = self.client_for(endpoint)?.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<IncusResponse>(&body) {
            Ok(envelope) => envelope.into_metadata(status, path),
            Err(_) if status == StatusCode::NOT_FOUND => {
                Err(InventoryError::NotFound(path.to_string()))
            }
            Err(e) => Err(InventoryError::Transport(format!(
                "{}: unexpected response ({}): {}",
                path, status, e
            ))),
        }
    }

    /// Recursive list of one collection
    async fn list(
        &self,
        endpoint: &Endpoint,
        path: &str,
        all_projects: bool,
        project: Option<&str>,
    ) -> InventoryResult<Vec<serde_json::Value>> {
        let mut query = vec![("recursion", "1")];
        if all_projects {
            query.push(("all-projects", "true"));
        }
        if let Some(project) = project {
            query.push(("project", project));
        }

        match self.get(endpoint, path, &query).await? {
            serde_json::Value::Array(items) => Ok(items),
            serde_json::Value::Null => Ok(Vec::new()),
            other => Err(InventoryError::Transport(format!(
                "{}: expected a list, got {}",
                path, other
            ))),
        }
    }

    /// Children of every network accepted by `accept`
    async fn list_network_children(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
        accept: fn(&serde_json::Value) -> bool,
    ) -> InventoryResult<Vec<RemoteResource>> {
        let mut resources = Vec::new();

        for network in self.list(endpoint, "/1.0/networks", true, None).await? {
            if !accept(&network) {
                continue;
            }
            let Some(name) = network["name"].as_str() else {
                continue;
            };
            let project = network["project"].as_str().unwrap_or("default");

            let path = collection_path(kind, name);
            for item in self.list(endpoint, &path, false, Some(project)).await? {
                resources.push(to_remote(kind, item, Some(name))?);
            }
        }

        Ok(resources)
    }

    /// Whether `endpoint` reports items that carry no location
    async fn owns_unlocated(&self, endpoint: &Endpoint) -> InventoryResult<bool> {
        let cluster = self.get(endpoint, "/1.0/cluster", &[]).await?;
        if cluster["enabled"].as_bool() != Some(true) {
            return Ok(true);
        }

        let members = self.get(endpoint, "/1.0/cluster/members", &[]).await?;
        Ok(match lowest_member(&members) {
            Some(owner) => owner == endpoint.name,
            None => true,
        })
    }

    /// Children of every storage pool
    async fn list_pool_children(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
        owns_unlocated: bool,
    ) -> InventoryResult<Vec<RemoteResource>> {
        let mut resources = Vec::new();

        for pool in self.list(endpoint, "/1.0/storage-pools", false, None).await? {
            let Some(name) = pool["name"].as_str() else {
                continue;
            };

            let path = collection_path(kind, name);
            for item in self.list(endpoint, &path, true, None).await? {
                if located_on(&item, &endpoint.name, owns_unlocated) {
                    resources.push(to_remote(kind, item, Some(name))?);
                }
            }
        }

        Ok(resources)
    }
}

#[async_trait]
impl ServerClient for IncusClient {
    async fn has_extension(&self, endpoint: &Endpoint, name: &str) -> bool {
        match self.get(endpoint, "/1.0", &[]).await {
            Ok(server) => server["api_extensions"]
                .as_array()
                .is_some_and(|extensions| extensions.iter().any(|e| e.as_str() == Some(name))),
            Err(e) => {
                warn!("Cannot query extensions of {}: {}", endpoint.name, e);
                false
            }
        }
    }

    async fn get_resources(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
    ) -> InventoryResult<Vec<RemoteResource>> {
        match kind {
            ResourceKind::NetworkForward => {
                self.list_network_children(endpoint, kind, is_bridge_or_ovn).await
            }
            ResourceKind::NetworkLoadBalancer | ResourceKind::NetworkPeer => {
                self.list_network_children(endpoint, kind, is_ovn).await
            }
            ResourceKind::StorageBucket | ResourceKind::StorageVolume => {
                let owns_unlocated = self.owns_unlocated(endpoint).await?;
                self.list_pool_children(endpoint, kind, owns_unlocated).await
            }
            _ => {
                let path = collection_path(kind, "");
                let all_projects = kind.layout().project;
                let owns_unlocated =
                    !kind.is_server_scoped() || self.owns_unlocated(endpoint).await?;

                let mut resources = Vec::new();
                for item in self.list(endpoint, &path, all_projects, None).await? {
                    if !kind.is_server_scoped()
                        || located_on(&item, &endpoint.name, owns_unlocated)
                    {
                        resources.push(to_remote(kind, item, None)?);
                    }
                }
                Ok(resources)
            }
        }
    }

    async fn get_resource(
        &self,
        endpoint: &Endpoint,
        kind: ResourceKind,
        locator: &ResourceLocator,
    ) -> InventoryResult<RemoteResource> {
        let path = resource_path(kind, locator)?;

        let mut query = Vec::new();
        if let Some(project) = locator.project.as_deref().filter(|p| !p.is_empty()) {
            query.push(("project", project));
        }
        if kind.is_server_scoped() {
            query.push(("target", endpoint.name.as_str()));
        }

        let object = self.get(endpoint, &path, &query).await?;
        Ok(RemoteResource::new(locator.clone(), object))
    }
}

fn read_pem(path: &Path) -> InventoryResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        InventoryError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })
}

fn is_bridge_or_ovn(network: &serde_json::Value) -> bool {
    network["managed"].as_bool() == Some(true)
        && matches!(network["type"].as_str(), Some("bridge") | Some("ovn"))
}

fn is_ovn(network: &serde_json::Value) -> bool {
    network["managed"].as_bool() == Some(true) && network["type"].as_str() == Some("ovn")
}

/// Whether an item belongs to the server `name`
///
/// Items without a location (standalone servers, shared pools) belong to the
/// server that owns unlocated items.
fn located_on(item: &serde_json::Value, name: &str, owns_unlocated: bool) -> bool {
    match item["location"].as_str() {
        None | Some("") | Some("none") => owns_unlocated,
        Some(location) => location == name,
    }
}

/// Lowest member name in a `/1.0/cluster/members` URL list
fn lowest_member(members: &serde_json::Value) -> Option<String> {
    members
        .as_array()?
        .iter()
        .filter_map(|url| url.as_str()?.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .filter_map(|name| urlencoding::decode(name).ok())
        .map(|name| name.into_owned())
        .min()
}

/// Field holding the resource name in list responses
fn name_field(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Image => "fingerprint",
        ResourceKind::NetworkForward | ResourceKind::NetworkLoadBalancer => "listen_address",
        _ => "name",
    }
}

fn to_remote(
    kind: ResourceKind,
    object: serde_json::Value,
    parent: Option<&str>,
) -> InventoryResult<RemoteResource> {
    let layout = kind.layout();

    let name = object[name_field(kind)]
        .as_str()
        .filter(|n| !n.is_empty())
        .ok_or(ValidationError::MissingField("name"))?
        .to_string();

    let mut locator = ResourceLocator::new(name);
    if layout.project {
        locator.project = Some(object["project"].as_str().unwrap_or("default").to_string());
    }
    if layout.parent.is_some() {
        locator.parent = parent.map(str::to_string);
    }
    if layout.volume_type {
        locator.volume_type = object["type"].as_str().map(str::to_string);
    }

    Ok(RemoteResource::new(locator, object))
}

/// Collection holding resources of `kind`; nested kinds live under `parent`
fn collection_path(kind: ResourceKind, parent: &str) -> String {
    let parent = urlencoding::encode(parent);

    match kind {
        ResourceKind::Image => "/1.0/images".to_string(),
        ResourceKind::Instance => "/1.0/instances".to_string(),
        ResourceKind::Network => "/1.0/networks".to_string(),
        ResourceKind::NetworkAcl => "/1.0/network-acls".to_string(),
        ResourceKind::NetworkAddressSet => "/1.0/network-address-sets".to_string(),
        ResourceKind::NetworkIntegration => "/1.0/network-integrations".to_string(),
        ResourceKind::NetworkZone => "/1.0/network-zones".to_string(),
        ResourceKind::Profile => "/1.0/profiles".to_string(),
        ResourceKind::Project => "/1.0/projects".to_string(),
        ResourceKind::StoragePool => "/1.0/storage-pools".to_string(),
        ResourceKind::NetworkForward => format!("/1.0/networks/{}/forwards", parent),
        ResourceKind::NetworkLoadBalancer => format!("/1.0/networks/{}/load-balancers", parent),
        ResourceKind::NetworkPeer => format!("/1.0/networks/{}/peers", parent),
        ResourceKind::StorageBucket => format!("/1.0/storage-pools/{}/buckets", parent),
        ResourceKind::StorageVolume => format!("/1.0/storage-pools/{}/volumes", parent),
    }
}

/// Path of one resource
fn resource_path(kind: ResourceKind, locator: &ResourceLocator) -> InventoryResult<String> {
    let name = urlencoding::encode(&locator.name);

    let parent = match kind.layout().parent {
        Some(_) => locator
            .parent
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::MissingField("parent"))?,
        None => "",
    };
    let collection = collection_path(kind, parent);

    if kind.layout().volume_type {
        let volume_type = locator
            .volume_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingField("volume_type"))?;
        return Ok(format!(
            "{}/{}/{}",
            collection,
            urlencoding::encode(volume_type),
            name
        ));
    }

    Ok(format!("{}/{}", collection, name))
}
