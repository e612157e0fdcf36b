#![deny(missing_docs)]

//! # Descriptor Model
//!
//! - **schema**: schema descriptors, shapes and type references.
//! - **operation**: operation, parameter, body and response descriptors.
//! - **graph**: the path-indexed descriptor store.

pub mod graph;
pub mod operation;
pub mod schema;

pub use graph::SchemaGraph;
pub use operation::{
    is_simple_operation, ContentDescriptor, ItemSchemaBinding, OperationDescriptor,
    ParameterDescriptor, RequestBodyDescriptor, ResponseDescriptor,
};
pub use schema::{
    Discriminator, Field, NestedRole, Origin, Overrides, ParamLocation, ParamOwner,
    SchemaDescriptor, Section, Shape, StructShape, TypeRef, UnionKind, UnionShape,
};
