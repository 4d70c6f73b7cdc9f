// Copyright (c) 2025 - Cowboy AI, Inc.

//! Remote client adapter implementations
//!
//! This module contains concrete implementations of the ServerClient trait
//! for the remote APIs the fleet runs.

#[cfg(feature = "incus")]
pub mod incus;

#[cfg(feature = "incus")]
pub use incus::{IncusClient, IncusClientConfig};
