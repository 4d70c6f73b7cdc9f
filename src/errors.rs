// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for inventory operations

use thiserror::Error;

use crate::domain::ValidationError;

/// Errors that can occur while syncing or reading the inventory
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Requested record, scope or remote resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identity or required-field invariant violated
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote call failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote server does not advertise a required extension
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Repository operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record with the same identity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl InventoryError {
    /// Whether this error reports an absent record or resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, InventoryError::NotFound(_))
    }
}

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Serialization(err.to_string())
    }
}

#[cfg(feature = "incus")]
impl From<reqwest::Error> for InventoryError {
    fn from(err: reqwest::Error) -> Self {
        InventoryError::Transport(err.to_string())
    }
}
