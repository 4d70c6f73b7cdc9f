// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Inventory Invariants
//!
//! A record is only valid when every scoping field its kind requires is
//! present, no field outside the kind's layout is set, and its stored UUID is
//! the one re-derived from its own fields. Required fields are checked first,
//! in identity order, and the first missing one is reported.

use uuid::Uuid;

use super::{ResourceKind, ScopeLayout};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A field required by the kind's scope layout is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field outside the kind's scope layout is set
    #[error("Field {field} is not part of the {kind} scope")]
    UnexpectedField {
        kind: ResourceKind,
        field: &'static str,
    },

    /// Stored UUID differs from the one derived from the record's fields
    #[error("UUID mismatch: stored {stored}, derived {derived}")]
    UuidMismatch { stored: Uuid, derived: Uuid },

    /// Resource kind name not recognised
    #[error("Unknown resource kind: {0}")]
    UnknownKind(String),

    /// Filter expression could not be evaluated
    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),
}

/// Scoping field values of a record, in identity order
#[derive(Debug, Clone, Copy)]
pub struct ScopeFields<'a> {
    pub cluster: &'a str,
    pub server: Option<&'a str>,
    pub project: Option<&'a str>,
    pub parent: Option<&'a str>,
    pub volume_type: Option<&'a str>,
    pub name: &'a str,
}

/// Validate that a required field is non-empty
pub fn validate_required(field: &'static str, value: Option<&str>) -> ValidationResult {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Validate scoping fields against the layout of a kind
///
/// # Rules
/// - `cluster` and `name` are always required
/// - `server`, `project`, `parent`, `volume_type` are required iff the layout
///   uses them, and must be absent otherwise
pub fn validate_scope(kind: ResourceKind, fields: &ScopeFields<'_>) -> ValidationResult {
    let layout: ScopeLayout = kind.layout();
    let checks = [
        ("cluster", true, Some(fields.cluster)),
        ("server", layout.server, fields.server),
        ("project", layout.project, fields.project),
        ("parent", layout.parent.is_some(), fields.parent),
        ("volume_type", layout.volume_type, fields.volume_type),
        ("name", true, Some(fields.name)),
    ];

    for (field, required, value) in checks {
        if required {
            validate_required(field, value)?;
        } else if value.is_some_and(|v| !v.is_empty()) {
            return Err(ValidationError::UnexpectedField { kind, field });
        }
    }

    Ok(())
}

/// Validate the stored UUID against the derived one
pub fn validate_identity(stored: Uuid, derived: Uuid) -> ValidationResult {
    if stored != derived {
        return Err(ValidationError::UuidMismatch { stored, derived });
    }
    Ok(())
}
