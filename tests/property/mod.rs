// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! This module contains property-based tests using proptest to verify
//! identity derivation and filter canonicalization for all inputs.

mod filter_canonical;
mod identity;
