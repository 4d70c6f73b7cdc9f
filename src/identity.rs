// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deterministic inventory identity
//!
//! Inventory records have no natural global key on the remote side, so their
//! UUID is derived from the addressable path of the resource:
//!
//! ```text
//! uuid = v5(INVENTORY_NAMESPACE, "cluster:server:project:parent:type:name")
//! ```
//!
//! Empty components are skipped. Each component is escaped before joining
//! (`\` → `\\`, `:` → `\:`) so distinct tuples never produce the same joined
//! string.
//!
//! # Example
//!
//! ```rust
//! use cim_inventory::identity::derive_uuid;
//!
//! let a = derive_uuid(&["c1", "s1", "default", "web01"]);
//! let b = derive_uuid(&["c1", "s1", "default", "web01"]);
//! assert_eq!(a, b);
//! assert_ne!(a, derive_uuid(&["c1", "s2", "default", "web01"]));
//! ```

use uuid::Uuid;

/// Root namespace for every inventory identity
pub const INVENTORY_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_53c2_8d0b_4e7a_9c41_2b7e_f05d_8a13);

/// Separator placed between identity components
pub const IDENTITY_SEPARATOR: char = ':';

const ESCAPE: char = '\\';

/// Derive the inventory UUID for an ordered list of scope components
pub fn derive_uuid<S: AsRef<str>>(components: &[S]) -> Uuid {
    Uuid::new_v5(&INVENTORY_NAMESPACE, identity_key(components).as_bytes())
}

/// Join the non-empty components into the hashed identity key
pub fn identity_key<S: AsRef<str>>(components: &[S]) -> String {
    let mut key = String::new();

    for component in components.iter().map(AsRef::as_ref) {
        if component.is_empty() {
            continue;
        }

        if !key.is_empty() {
            key.push(IDENTITY_SEPARATOR);
        }

        for c in component.chars() {
            if c == ESCAPE || c == IDENTITY_SEPARATOR {
                key.push(ESCAPE);
            }
            key.push(c);
        }
    }

    key
}
