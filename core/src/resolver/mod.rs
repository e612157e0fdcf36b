#![deny(missing_docs)]

//! # Resolver Module
//!
//! The resolution pipeline. Phases run in a fixed order over one graph:
//!
//! - **gather**: builds the schema graph (Schema Graph Builder).
//! - **composition**: classifies each descriptor's shape (Composition Resolver).
//! - **naming**: assigns final names and mangled operation ids (Name Resolver).
//! - **operations**: binds operations to named descriptors (Operation Descriptor Builder).
//!
//! A run either completes or fails on the first fatal error; nothing partial is
//! returned.

pub mod composition;
pub mod gather;
pub mod naming;
pub mod operations;

pub use composition::{resolve_compositions, CompositionPolicy};
pub use gather::build_schema_graph;
pub use naming::{mangle_operation_ids, resolve_names};
pub use operations::{build_operations, path_placeholders};

use crate::config::ResolverConfig;
use crate::content_types::ContentTypeMatcher;
use crate::context::CodegenContext;
use crate::error::AppResult;
use crate::model::graph::SchemaGraph;
use crate::model::operation::OperationDescriptor;
use crate::model::schema::{SchemaDescriptor, TypeRef};
use crate::oas::document::OpenApiDocument;
use crate::oas::pointer::SchemaPath;
use crate::oas::walk::collect_operations;
use crate::struct_tags::StructTagRenderer;
use serde::Serialize;

/// Rendered name of [`TypeRef::Any`].
pub const ANY_TYPE: &str = "serde_json::Value";

/// The finalized, read-only result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedApi {
    schemas: SchemaGraph,
    operations: Vec<OperationDescriptor>,
    context: CodegenContext,
}

impl ResolvedApi {
    /// Descriptors in visitation order.
    pub fn schemas(&self) -> impl Iterator<Item = &SchemaDescriptor> {
        self.schemas.iter()
    }

    /// The descriptor graph.
    pub fn graph(&self) -> &SchemaGraph {
        &self.schemas
    }

    /// Descriptor at `path`.
    pub fn schema(&self, path: &SchemaPath) -> Option<&SchemaDescriptor> {
        self.schemas.get(path)
    }

    /// Descriptor whose final name is `name`, searching in visitation order.
    pub fn schema_named(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.schemas.iter().find(|d| d.final_name() == Some(name))
    }

    /// Follows alias chains (see [`SchemaGraph::resolve_alias`]).
    pub fn resolve_alias<'a>(&'a self, ty: &'a TypeRef) -> &'a TypeRef {
        self.schemas.resolve_alias(ty)
    }

    /// Name to print for a type reference.
    pub fn type_name(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Schema { path } => self
                .schemas
                .get(path)
                .and_then(SchemaDescriptor::final_name)
                .map(str::to_string)
                .unwrap_or_else(|| ANY_TYPE.to_string()),
            TypeRef::Primitive(spec) => spec.ty.clone(),
            TypeRef::Any => ANY_TYPE.to_string(),
        }
    }

    /// Operations in walk order.
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Operations eligible for the simplified client surface.
    pub fn simple_operations(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter().filter(|op| op.simple)
    }

    /// Operation by raw operation id.
    pub fn operation(&self, operation_id: &str) -> Option<&OperationDescriptor> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }

    /// Features the resolved document uses.
    pub fn context(&self) -> &CodegenContext {
        &self.context
    }
}

/// Runs the full pipeline over a loaded document.
pub fn resolve(doc: &OpenApiDocument, config: &ResolverConfig) -> AppResult<ResolvedApi> {
    let config = config.effective();
    let matcher = ContentTypeMatcher::new(&config.content_types)?;
    let tags = StructTagRenderer::new(&config.struct_tags);
    let mut context = CodegenContext::new();

    // 1. Walk + gather
    let sites = collect_operations(doc)?;
    tracing::debug!(version = doc.version(), operations = sites.len(), "resolving document");
    let mut schemas = build_schema_graph(doc, &sites, &matcher)?;

    // 2. Shapes
    let policy = CompositionPolicy {
        mapper: &config.type_mapping,
        mangling: &config.name_mangling,
        tags: &tags,
    };
    resolve_compositions(doc, &mut schemas, &policy, &mut context)?;

    // 3. Names
    let mangled_ids = mangle_operation_ids(&sites, &config.name_mangling);
    resolve_names(&mut schemas, &mangled_ids, &config.name_mangling, &matcher)?;

    // 4. Operations
    let operations = build_operations(
        doc,
        &sites,
        &schemas,
        &mangled_ids,
        &matcher,
        &config.name_mangling,
        &mut context,
    )?;

    Ok(ResolvedApi {
        schemas,
        operations,
        context,
    })
}

/// Parses YAML (or JSON) source and resolves it.
pub fn resolve_yaml(content: &str, config: &ResolverConfig) -> AppResult<ResolvedApi> {
    let doc = OpenApiDocument::from_yaml_str(content)?;
    resolve(&doc, config)
}
