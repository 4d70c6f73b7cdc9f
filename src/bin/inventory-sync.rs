// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory Sync Service
//!
//! Syncs every configured resource kind of every cluster from its Incus
//! servers, then prints the fleet aggregate as JSON.
//!
//! Run with: cargo run --bin inventory-sync --features incus
//!
//! Environment:
//! - `INVENTORY_CONFIG`: fleet configuration file (default: inventory.json)
//! - `INVENTORY_CLUSTER`: only sync and print this cluster
//! - `INVENTORY_FILTER`: expression applied to the printed aggregate
//! - `INCUS_CLIENT_CERT` / `INCUS_CLIENT_KEY`: PEM client identity
//! - `INCUS_TIMEOUT_SECS`: request timeout (default: 30)
//! - `INCUS_INSECURE`: set to `true` to skip certificate verification

use anyhow::{Context, Result};
use cim_inventory::{
    adapters::{IncusClient, IncusClientConfig},
    AggregateFilter, FleetConfig, FleetInventory,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Configuration for the sync service
#[derive(Debug, Clone)]
struct SyncConfig {
    /// Fleet configuration file
    fleet_path: PathBuf,
    /// Restrict to one cluster
    cluster: Option<String>,
    /// Aggregate expression
    filter: Option<String>,
    /// Incus client configuration
    incus: IncusClientConfig,
}

impl SyncConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let fleet_path = std::env::var("INVENTORY_CONFIG")
            .unwrap_or_else(|_| "inventory.json".to_string())
            .into();

        let cluster = std::env::var("INVENTORY_CLUSTER").ok().filter(|c| !c.is_empty());
        let filter = std::env::var("INVENTORY_FILTER").ok().filter(|f| !f.is_empty());

        let timeout_secs = match std::env::var("INCUS_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("INCUS_TIMEOUT_SECS is not a number: {}", raw))?,
            Err(_) => 30,
        };

        let incus = IncusClientConfig {
            timeout_secs,
            client_certificate_path: std::env::var("INCUS_CLIENT_CERT").ok().map(PathBuf::from),
            client_key_path: std::env::var("INCUS_CLIENT_KEY").ok().map(PathBuf::from),
            accept_invalid_certs: std::env::var("INCUS_INSECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        Ok(Self {
            fleet_path,
            cluster,
            filter,
            incus,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting inventory sync");

    let config = SyncConfig::from_env()?;
    let fleet = FleetConfig::load(&config.fleet_path)
        .with_context(|| format!("Failed to load {}", config.fleet_path.display()))?;
    info!("Configuration loaded:");
    info!("  - Fleet: {}", config.fleet_path.display());
    info!("  - Clusters: {}", fleet.clusters.len());
    info!("  - Kinds: {}", fleet.kinds.len());

    let client = IncusClient::new(config.incus.clone()).context("Failed to create Incus client")?;
    let directory = Arc::new(fleet.to_directory());
    let inventory = FleetInventory::in_memory(
        fleet.kinds.iter().copied(),
        Arc::new(client),
        directory.clone(),
        directory,
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling sync");
            on_interrupt.cancel();
        }
    });

    let synced = match &config.cluster {
        Some(cluster) => inventory.sync_cluster(&cancel, cluster).await,
        None => inventory.sync_all(&cancel).await,
    };
    synced.context("Inventory sync failed")?;

    let mut filter = AggregateFilter::new();
    filter.cluster = config.cluster.clone();
    filter.expression = config.filter.clone();

    let aggregates = inventory
        .aggregation()
        .get_all_with_filter(&filter)
        .await
        .context("Failed to aggregate inventory")?;

    println!("{}", serde_json::to_string_pretty(&aggregates)?);
    info!("Printed {} cluster snapshots", aggregates.len());

    Ok(())
}
