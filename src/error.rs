//! Error taxonomy
//!
//! Construction-time failures are fail-fast and typed: they abort the current
//! synthesis run at the call that caused them. Validation findings are *not*
//! errors - they are collected as plain strings by [`crate::tree::Tree::validate`]
//! and returned by value, so a full subtree walk reports every problem at once.

use thiserror::Error;

/// Fail-fast errors raised while building the tree or constructing resources.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Lookup of a direct child by id found nothing.
    #[error("no child with id '{id}' under '{path}'")]
    ChildNotFound { path: String, id: String },

    /// Context key absent on the node and on every ancestor up to the root.
    #[error("context key '{key}' not found from '{path}' up to the root")]
    ContextKeyNotFound { path: String, key: String },

    /// A sibling with the same id already exists.
    #[error("'{path}' already has a child named '{id}'")]
    DuplicateChildId { path: String, id: String },

    /// Structural mutation attempted at or below a locked node.
    #[error("cannot mutate '{path}': the tree is locked at '{locked_at}'")]
    LockedTreeMutation { path: String, locked_at: String },

    /// Resource configuration out of bounds for the active target.
    #[error("{field} {value} for '{path}' violates {bound}")]
    ConstraintViolation {
        path: String,
        field: String,
        value: String,
        bound: String,
    },

    /// The active target cannot use this resource as a callback binding point.
    #[error("target '{target}' does not support handler binding on {kind} '{path}'")]
    HandlerBindingNotSupported {
        target: String,
        kind: String,
        path: String,
    },
}

impl SynthError {
    /// Create a constraint violation for a numeric field.
    pub fn constraint(
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl ToString,
        bound: impl Into<String>,
    ) -> Self {
        SynthError::ConstraintViolation {
            path: path.into(),
            field: field.into(),
            value: value.to_string(),
            bound: bound.into(),
        }
    }

    /// The tree path this error refers to, if it carries one.
    pub fn path(&self) -> &str {
        match self {
            SynthError::ChildNotFound { path, .. }
            | SynthError::ContextKeyNotFound { path, .. }
            | SynthError::DuplicateChildId { path, .. }
            | SynthError::LockedTreeMutation { path, .. }
            | SynthError::ConstraintViolation { path, .. }
            | SynthError::HandlerBindingNotSupported { path, .. } => path,
        }
    }
}

/// Convenience alias for fail-fast results in this crate.
pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_names_bound_and_value() {
        let err = SynthError::constraint(
            "Root/Fn",
            "memory_mb",
            64,
            "supported range [128, 10240] MB on aws",
        );
        let msg = err.to_string();
        assert!(msg.contains("64"), "message should carry the offending value");
        assert!(
            msg.contains("[128, 10240]"),
            "message should carry the violated bound"
        );
    }

    #[test]
    fn test_path_accessor() {
        let err = SynthError::DuplicateChildId {
            path: "Root".to_string(),
            id: "A".to_string(),
        };
        assert_eq!(err.path(), "Root");
    }
}
