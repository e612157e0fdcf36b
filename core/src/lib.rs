#![deny(missing_docs)]

//! # oasgraph Core
//!
//! Turns an OpenAPI 3.x document into a resolved descriptor model: every schema
//! occurrence gets a shape and a unique name, and every operation is bound to those
//! descriptors by path. Emitters consume the result read-only.

/// Shared error types.
pub mod error;

/// Resolver configuration (YAML).
pub mod config;

/// Media type classification and naming tokens.
pub mod content_types;

/// Per-run feature registry.
pub mod context;

/// Identifier mangling policy.
pub mod mangle;

/// Descriptor model: schemas, shapes, operations.
pub mod model;

/// Document loading, references and the operation walk.
pub mod oas;

/// The resolution pipeline.
pub mod resolver;

/// Field annotation templates.
pub mod struct_tags;

/// Primitive type mapping (OpenAPI type/format -> Rust).
pub mod type_mapping;

pub use config::ResolverConfig;
pub use context::CodegenContext;
pub use error::{AppError, AppResult};
pub use model::{
    Field, OperationDescriptor, SchemaDescriptor, SchemaGraph, Section, Shape, TypeRef,
};
pub use oas::{OpenApiDocument, SchemaPath};
pub use resolver::{resolve, resolve_yaml, ResolvedApi};
pub use type_mapping::{TypeMapper, TypeMapping, TypeSpec};
