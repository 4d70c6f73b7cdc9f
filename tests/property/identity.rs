// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Identity Derivation

use cim_inventory::domain::{InventoryRecord, ResourceKind, ResourceLocator, ValidationError};
use cim_inventory::identity::{derive_uuid, identity_key};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn component() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9._-]{0,11}"
}

fn scope_tuple() -> impl Strategy<Value = [String; 6]> {
    [
        component(),
        component(),
        component(),
        component(),
        component(),
        component(),
    ]
}

/// Components built from the separator and escape characters
fn tricky_component() -> impl Strategy<Value = String> {
    "[a:\\\\]{1,4}"
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Derivation is deterministic
    #[test]
    fn prop_derivation_is_deterministic(fields in scope_tuple()) {
        prop_assert_eq!(derive_uuid(&fields), derive_uuid(&fields.clone()));
    }

    /// Property: Changing any single scoping field changes the UUID
    #[test]
    fn prop_single_field_change_changes_uuid(
        fields in scope_tuple(),
        index in 0usize..6,
        replacement in component(),
    ) {
        prop_assume!(fields[index] != replacement);

        let mut changed = fields.clone();
        changed[index] = replacement;

        prop_assert_ne!(derive_uuid(&fields), derive_uuid(&changed));
    }

    /// Property: The joined key is injective even when components contain
    /// the separator or the escape character
    #[test]
    fn prop_escaped_join_is_injective(
        a in tricky_component(),
        b in tricky_component(),
        c in tricky_component(),
        d in tricky_component(),
    ) {
        prop_assume!((&a, &b) != (&c, &d));

        prop_assert_ne!(identity_key(&[&a, &b]), identity_key(&[&c, &d]));
        prop_assert_ne!(derive_uuid(&[&a, &b]), derive_uuid(&[&c, &d]));
    }

    /// Property: Built records validate, and moving one to another server
    /// without re-deriving is caught
    #[test]
    fn prop_record_identity_round_trip(
        cluster in component(),
        server in component(),
        other_server in component(),
        name in component(),
    ) {
        prop_assume!(server != other_server);

        let record = InventoryRecord::builder(ResourceKind::Instance, cluster)
            .server(server)
            .locator(ResourceLocator::new(name).with_project("default"))
            .build()
            .unwrap();
        prop_assert!(record.validate().is_ok());

        let mut moved = record.clone();
        moved.server = Some(other_server);
        let is_mismatch = matches!(moved.validate(), Err(ValidationError::UuidMismatch { .. }));
        prop_assert!(is_mismatch);
    }
}

#[test]
fn test_delimiter_collision_pair_is_distinct() {
    assert_ne!(derive_uuid(&["a:b", "c"]), derive_uuid(&["a", "b:c"]));
}
