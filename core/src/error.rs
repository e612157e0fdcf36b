//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Structural failures carry the [`SchemaPath`] of the offending node so the
//! operator can find it in the source document.

use crate::oas::pointer::SchemaPath;
use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The input could not be parsed as an OpenAPI 3.x document.
    #[from(ignore)]
    #[display("Document Error: {_0}")]
    Document(String),

    /// A `$ref` points at nothing (or somewhere we refuse to follow).
    #[from(ignore)]
    #[display("Dangling reference '{reference}' at {path}")]
    DanglingRef {
        /// Location of the reference object.
        path: SchemaPath,
        /// The raw `$ref` value.
        reference: String,
    },

    /// A schema node whose shape cannot be classified.
    #[from(ignore)]
    #[display("Unclassifiable schema at {path}: {reason}")]
    UnclassifiableSchema {
        /// Location of the schema.
        path: SchemaPath,
        /// What was wrong with it.
        reason: String,
    },

    /// Two type-name overrides claim the same identifier.
    #[from(ignore)]
    #[display("Type name override '{name}' used by both {first} and {second}")]
    OverrideCollision {
        /// The contested name.
        name: String,
        /// First claimant, in visitation order.
        first: SchemaPath,
        /// Second claimant.
        second: SchemaPath,
    },

    /// Two operations declare the same `operationId`.
    #[from(ignore)]
    #[display("Duplicate operationId '{operation_id}' at {first} and {second}")]
    DuplicateOperationId {
        /// The repeated id.
        operation_id: String,
        /// First declaring operation.
        first: SchemaPath,
        /// Second declaring operation.
        second: SchemaPath,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_dangling_ref_display_includes_path() {
        let err = AppError::DanglingRef {
            path: SchemaPath::root().join("components").join("schemas").join("Pet"),
            reference: "#/components/schemas/Missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Dangling reference '#/components/schemas/Missing' at #/components/schemas/Pet"
        );
    }

    #[test]
    fn test_override_collision_display_names_both_paths() {
        let a = SchemaPath::root().join("components").join("schemas").join("A");
        let b = SchemaPath::root().join("components").join("schemas").join("B");
        let err = AppError::OverrideCollision {
            name: "Custom".into(),
            first: a,
            second: b,
        };
        let msg = err.to_string();
        assert!(msg.contains("#/components/schemas/A"));
        assert!(msg.contains("#/components/schemas/B"));
    }
}
