#![deny(missing_docs)]

//! # OpenAPI Document Module
//!
//! - **document**: loading, version checks and `$ref` dereferencing.
//! - **normalization**: rewrites applied before any schema is visited.
//! - **pointer**: the structural path type used as descriptor identity.
//! - **walk**: ordered iteration over operations (paths, webhooks, callbacks).

pub mod document;
pub(crate) mod normalization;
pub mod pointer;
pub(crate) mod ref_utils;
pub mod walk;

pub use document::OpenApiDocument;
pub use pointer::SchemaPath;
