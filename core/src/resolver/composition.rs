#![deny(missing_docs)]

//! # Composition Resolver
//!
//! Classifies the shape of every descriptor in the graph. Runs in three passes so
//! that a shape, once stored on a descriptor, never changes:
//!
//! 1. **Draft**: each descriptor is classified from its own schema node. Member and
//!    field types are references by path.
//! 2. **Refine**: with every draft known, nullable wrappers are flattened, union
//!    members are deduplicated by identity, and struct fields get their pointer,
//!    omit-empty and tag decisions.
//! 3. **Commit**: shapes and propagated directives are written to the graph.

use crate::context::{CodegenContext, CUSTOM_TYPE_NULLABLE, HELPER_UNION_JSON};
use crate::error::{AppError, AppResult};
use crate::mangle::NameMangling;
use crate::model::graph::SchemaGraph;
use crate::model::schema::{
    Discriminator, Field, Overrides, SchemaDescriptor, Shape, StructShape, TypeRef, UnionKind,
    UnionShape,
};
use crate::oas::document::{ref_target, OpenApiDocument};
use crate::oas::pointer::SchemaPath;
use crate::resolver::gather::is_null_schema;
use crate::struct_tags::{StructTagRenderer, TagData};
use crate::type_mapping::TypeMapper;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

const KNOWN_TYPES: [&str; 7] = [
    "string", "integer", "number", "boolean", "array", "object", "null",
];

/// Keywords that make an `allOf` member contribute structure rather than annotations.
const SUBSTANTIVE_KEYWORDS: [&str; 11] = [
    "$ref",
    "type",
    "properties",
    "additionalProperties",
    "items",
    "allOf",
    "oneOf",
    "anyOf",
    "enum",
    "format",
    "const",
];

/// Policies the composition resolver reads.
pub struct CompositionPolicy<'a> {
    /// Primitive type mapping.
    pub mapper: &'a dyn TypeMapper,
    /// Field identifier mangling.
    pub mangling: &'a NameMangling,
    /// Field annotation templates.
    pub tags: &'a StructTagRenderer,
}

#[derive(Debug, Clone)]
struct Draft {
    shape: Shape,
    nullable: bool,
    overrides: Overrides,
}

/// Classifies every descriptor of `graph`.
pub fn resolve_compositions(
    doc: &OpenApiDocument,
    graph: &mut SchemaGraph,
    policy: &CompositionPolicy<'_>,
    ctx: &mut CodegenContext,
) -> AppResult<()> {
    // 1. Draft
    let mut drafts = Vec::with_capacity(graph.len());
    {
        let mut classifier = Classifier {
            doc,
            graph: &*graph,
            policy,
            ctx: &mut *ctx,
        };
        for descriptor in graph.iter() {
            drafts.push(classifier.classify(descriptor)?);
        }
    }

    // 2. Refine
    let lookup = DraftLookup {
        graph: &*graph,
        drafts: &drafts,
    };
    let refined: Vec<Shape> = drafts
        .iter()
        .map(|draft| lookup.refine(&draft.shape, policy))
        .collect();

    // 3. Commit
    for (i, (draft, shape)) in drafts.into_iter().zip(refined).enumerate() {
        if draft.nullable || matches!(shape, Shape::NullableWrapper { .. }) {
            ctx.need_custom_type(CUSTOM_TYPE_NULLABLE);
        }
        if matches!(shape, Shape::UnionWrapper(_)) {
            ctx.need_helper(HELPER_UNION_JSON);
        }
        if let Some(descriptor) = graph.by_index_mut(i) {
            descriptor.nullable = draft.nullable;
            descriptor.overrides = draft.overrides;
            descriptor.set_shape(shape)?;
        }
    }

    tracing::debug!(descriptors = graph.len(), "compositions resolved");
    Ok(())
}

fn unclassifiable(path: &SchemaPath, reason: impl Into<String>) -> AppError {
    AppError::UnclassifiableSchema {
        path: path.clone(),
        reason: reason.into(),
    }
}

/// Declared `type` keyword as a list.
fn schema_types(node: &Value, at: &SchemaPath) -> AppResult<Vec<String>> {
    let types = match node.get("type") {
        None => Vec::new(),
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|t| {
                t.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| unclassifiable(at, "'type' entries must be strings"))
            })
            .collect::<AppResult<_>>()?,
        Some(_) => return Err(unclassifiable(at, "'type' must be a string or a list")),
    };
    if let Some(unknown) = types.iter().find(|t| !KNOWN_TYPES.contains(&t.as_str())) {
        return Err(unclassifiable(at, format!("unknown type '{}'", unknown)));
    }
    Ok(types)
}

fn is_annotation_only(node: &Value) -> bool {
    node.as_object()
        .is_some_and(|map| !SUBSTANTIVE_KEYWORDS.iter().any(|k| map.contains_key(*k)))
}

fn required_names(node: &Value) -> impl Iterator<Item = String> + '_ {
    node.get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
}

#[derive(Default)]
struct Merge {
    fields: IndexMap<String, Field>,
    required: HashSet<String>,
    additional: Option<TypeRef>,
    substantive: Vec<TypeRef>,
    annotations: Overrides,
    has_object_content: bool,
}

struct Classifier<'a, 'g> {
    doc: &'a OpenApiDocument,
    graph: &'g SchemaGraph,
    policy: &'a CompositionPolicy<'a>,
    ctx: &'a mut CodegenContext,
}

impl Classifier<'_, '_> {
    fn classify(&mut self, descriptor: &SchemaDescriptor) -> AppResult<Draft> {
        let doc = self.doc;
        let at = &descriptor.path;
        let node = doc
            .node(at)
            .ok_or_else(|| unclassifiable(at, "schema node not found"))?;
        let mut draft = Draft {
            shape: Shape::Alias {
                target: TypeRef::Any,
            },
            nullable: false,
            overrides: descriptor.overrides.clone(),
        };

        if !node.is_object() {
            return Err(unclassifiable(at, "schema must be a mapping"));
        }

        // 1. Component that is only a reference
        if ref_target(node).is_some() {
            draft.shape = Shape::Alias {
                target: self.child(node, at)?,
            };
            return Ok(draft);
        }

        // 2. Full type override short-circuits inference
        if let Some(spec) = &descriptor.overrides.type_override {
            if let Some(import) = &spec.import {
                self.ctx.add_import(import.clone());
            }
            draft.shape = Shape::Alias {
                target: TypeRef::Primitive(spec.clone()),
            };
            return Ok(draft);
        }

        let types = schema_types(node, at)?;
        let type_nullable = types.iter().any(|t| t == "null");
        let non_null: Vec<&str> = types
            .iter()
            .map(String::as_str)
            .filter(|t| *t != "null")
            .collect();

        // 3. oneOf / anyOf
        for (keyword, kind) in [("oneOf", UnionKind::OneOf), ("anyOf", UnionKind::AnyOf)] {
            if let Some(members) = node.get(keyword) {
                return self.union(node, members, at, keyword, kind, type_nullable, draft);
            }
        }

        // 4. allOf
        if let Some(members) = node.get("allOf") {
            let members = members
                .as_array()
                .ok_or_else(|| unclassifiable(at, "'allOf' must be a list"))?;
            return self.all_of(node, members, at, type_nullable, draft);
        }

        // 5. Arrays
        if non_null.contains(&"array") || (non_null.is_empty() && node.get("items").is_some()) {
            let element = match node.get("items").filter(|v| v.is_object()) {
                Some(items) => self.child(items, &at.join("items"))?,
                None => TypeRef::Any,
            };
            draft.nullable = type_nullable;
            draft.shape = Shape::Array { element };
            return Ok(draft);
        }

        // 6. Objects
        let is_object = non_null.contains(&"object")
            || (non_null.is_empty()
                && (node.get("properties").is_some()
                    || node.get("additionalProperties").is_some()));
        if is_object {
            let mut merge = Merge::default();
            self.add_object(node, at, &mut merge)?;
            draft.nullable = type_nullable;
            draft.shape = Shape::Struct(self.finish_struct(merge));
            return Ok(draft);
        }

        // 7. Scalars
        draft.shape = match non_null.as_slice() {
            [scalar] => {
                let target = self.primitive(scalar, node);
                if type_nullable {
                    Shape::NullableWrapper { inner: target }
                } else {
                    Shape::Alias { target }
                }
            }
            [] if type_nullable => Shape::NullableWrapper {
                inner: TypeRef::Any,
            },
            _ => Shape::Alias {
                target: TypeRef::Any,
            },
        };
        Ok(draft)
    }

    fn primitive(&mut self, schema_type: &str, node: &Value) -> TypeRef {
        let format = node.get("format").and_then(Value::as_str);
        match self.policy.mapper.map(schema_type, format) {
            Some(spec) => {
                if let Some(import) = &spec.import {
                    self.ctx.add_import(import.clone());
                }
                TypeRef::Primitive(spec)
            }
            None => TypeRef::Any,
        }
    }

    /// Type of a schema position: a descriptor when one exists there (or at its
    /// reference target), otherwise an inline primitive.
    fn child(&mut self, node: &Value, at: &SchemaPath) -> AppResult<TypeRef> {
        let doc = self.doc;
        let (target_node, target_path) = if ref_target(node).is_some() {
            let located = doc.locate(node, at)?;
            (located.node, located.path)
        } else {
            (node, at.clone())
        };
        if self.graph.contains(&target_path) {
            return Ok(TypeRef::schema(target_path));
        }
        let types = schema_types(target_node, &target_path)?;
        let non_null: Vec<&String> = types.iter().filter(|t| *t != "null").collect();
        Ok(match non_null.as_slice() {
            [scalar] if !matches!(scalar.as_str(), "array" | "object") => {
                self.primitive(scalar, target_node)
            }
            _ => TypeRef::Any,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn union(
        &mut self,
        node: &Value,
        members: &Value,
        at: &SchemaPath,
        keyword: &str,
        kind: UnionKind,
        type_nullable: bool,
        mut draft: Draft,
    ) -> AppResult<Draft> {
        let members = members
            .as_array()
            .ok_or_else(|| unclassifiable(at, format!("'{}' must be a list", keyword)))?;
        let base = at.join(keyword);

        let mut has_null = type_nullable;
        let mut refs = Vec::new();
        for (i, member) in members.iter().enumerate() {
            if is_null_schema(member) {
                has_null = true;
                continue;
            }
            refs.push(self.child(member, &base.join(i.to_string()))?);
        }

        draft.shape = match (refs.len(), has_null) {
            (1, true) => Shape::NullableWrapper {
                inner: refs.remove(0),
            },
            (0, true) => Shape::NullableWrapper {
                inner: TypeRef::Any,
            },
            (count, _) => {
                if count == 0 {
                    tracing::warn!(path = %at, "empty '{}' composition", keyword);
                }
                draft.nullable = has_null;
                Shape::UnionWrapper(UnionShape {
                    kind,
                    members: refs,
                    discriminator: self.discriminator(node, at)?,
                })
            }
        };
        Ok(draft)
    }

    fn discriminator(&self, node: &Value, at: &SchemaPath) -> AppResult<Option<Discriminator>> {
        let Some(disc) = node.get("discriminator") else {
            return Ok(None);
        };
        let Some(property_name) = disc.get("propertyName").and_then(Value::as_str) else {
            tracing::debug!(path = %at, "ignoring discriminator without propertyName");
            return Ok(None);
        };

        let mut mapping = IndexMap::new();
        if let Some(entries) = disc.get("mapping").and_then(Value::as_object) {
            let disc_path = at.join("discriminator").join("mapping");
            for (tag, target) in entries {
                let Some(target) = target.as_str() else {
                    continue;
                };
                let reference = if target.contains('#') || target.contains('/') {
                    target.to_string()
                } else {
                    format!("#/components/schemas/{}", target)
                };
                let reference = json!({ "$ref": reference });
                let located = self.doc.locate(&reference, &disc_path.join(tag.as_str()))?;
                mapping.insert(tag.clone(), located.path);
            }
        }

        Ok(Some(Discriminator {
            property_name: property_name.to_string(),
            mapping,
        }))
    }

    fn all_of(
        &mut self,
        node: &Value,
        members: &[Value],
        at: &SchemaPath,
        type_nullable: bool,
        mut draft: Draft,
    ) -> AppResult<Draft> {
        let mut merge = Merge::default();
        let mut visited = HashSet::new();
        visited.insert(at.clone());
        self.collect_all_of(members, &at.join("allOf"), &mut merge, &mut visited)?;

        if node.get("properties").is_some() {
            self.add_object(node, at, &mut merge)?;
        }
        merge.required.extend(required_names(node));
        draft.overrides.absorb(&merge.annotations);
        draft.nullable = type_nullable;

        if !merge.has_object_content && merge.substantive.len() == 1 {
            draft.shape = Shape::Alias {
                target: merge.substantive.remove(0),
            };
            return Ok(draft);
        }
        draft.shape = Shape::Struct(self.finish_struct(merge));
        Ok(draft)
    }

    fn collect_all_of(
        &mut self,
        members: &[Value],
        base: &SchemaPath,
        merge: &mut Merge,
        visited: &mut HashSet<SchemaPath>,
    ) -> AppResult<()> {
        let doc = self.doc;
        for (i, member) in members.iter().enumerate() {
            let member_path = base.join(i.to_string());
            merge
                .annotations
                .absorb(&Overrides::from_schema(member, &member_path));

            let located = doc.locate(member, &member_path)?;
            if !visited.insert(located.path.clone()) {
                tracing::debug!(path = %located.path, "allOf cycle, member skipped");
                continue;
            }
            if is_annotation_only(located.node) {
                continue;
            }

            merge.substantive.push(self.child(member, &member_path)?);
            if let Some(nested) = located.node.get("allOf").and_then(Value::as_array) {
                self.collect_all_of(nested, &located.path.join("allOf"), merge, visited)?;
            }
            let target_types = schema_types(located.node, &located.path)?;
            if located.node.get("properties").is_some()
                || target_types.iter().any(|t| t == "object")
            {
                self.add_object(located.node, &located.path, merge)?;
            }
        }
        Ok(())
    }

    /// Adds an object schema's properties and `additionalProperties` to `merge`.
    ///
    /// A field seen again keeps its position and accumulates directives. It takes
    /// the new type only when the repeated property is substantive.
    fn add_object(&mut self, node: &Value, at: &SchemaPath, merge: &mut Merge) -> AppResult<()> {
        merge.has_object_content = true;
        merge.required.extend(required_names(node));

        if let Some(props) = node.get("properties").and_then(Value::as_object) {
            let base = at.join("properties");
            for (name, prop) in props {
                let prop_path = base.join(name.as_str());
                let ty = self.child(prop, &prop_path)?;
                let overrides = Overrides::from_schema(prop, &prop_path);
                let description = prop
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let deprecated = prop
                    .get("deprecated")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

                match merge.fields.get_mut(name) {
                    Some(existing) => {
                        if !is_annotation_only(prop) {
                            existing.ty = ty;
                        }
                        existing.overrides.absorb(&overrides);
                        if description.is_some() {
                            existing.description = description;
                        }
                        existing.deprecated |= deprecated;
                    }
                    None => {
                        merge.fields.insert(
                            name.clone(),
                            Field {
                                name: name.clone(),
                                ident: String::new(),
                                ty,
                                optional: true,
                                pointer: false,
                                omit_empty: false,
                                overrides,
                                tags: IndexMap::new(),
                                description,
                                deprecated,
                            },
                        );
                    }
                }
            }
        }

        match node.get("additionalProperties") {
            Some(Value::Bool(true)) => merge.additional = Some(TypeRef::Any),
            Some(extra @ Value::Object(_)) => {
                merge.additional = Some(self.child(extra, &at.join("additionalProperties"))?);
            }
            _ => {}
        }
        if node.get("properties").is_none()
            && node.get("additionalProperties").is_none()
            && merge.fields.is_empty()
            && merge.additional.is_none()
        {
            // Free-form object.
            merge.additional = Some(TypeRef::Any);
        }
        Ok(())
    }

    fn finish_struct(&self, merge: Merge) -> StructShape {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let fields = merge
            .fields
            .into_values()
            .map(|mut field| {
                field.optional = !merge.required.contains(&field.name);
                let base = self.policy.mangling.field_name(&field.name);
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                field.ident = if *count == 1 {
                    base
                } else {
                    format!("{}_{}", base, count)
                };
                field
            })
            .collect();
        StructShape {
            fields,
            additional_properties: merge.additional,
        }
    }
}

struct DraftLookup<'a> {
    graph: &'a SchemaGraph,
    drafts: &'a [Draft],
}

#[derive(Default)]
struct TargetTraits {
    skip_optional_pointer: bool,
    nullable: bool,
    omit_empty: Option<bool>,
}

impl DraftLookup<'_> {
    fn draft(&self, path: &SchemaPath) -> Option<&Draft> {
        self.graph.position(path).and_then(|i| self.drafts.get(i))
    }

    /// Follows alias drafts to the type a reference ultimately denotes.
    fn identity<'t>(&'t self, ty: &'t TypeRef) -> &'t TypeRef {
        let mut current = ty;
        for _ in 0..=self.drafts.len() {
            match current.as_schema().and_then(|p| self.draft(p)) {
                Some(Draft {
                    shape: Shape::Alias { target },
                    ..
                }) => current = target,
                _ => break,
            }
        }
        current
    }

    fn traits(&self, ty: &TypeRef) -> TargetTraits {
        let mut out = TargetTraits::default();
        let mut current = ty;
        for _ in 0..=self.drafts.len() {
            let Some(draft) = current.as_schema().and_then(|p| self.draft(p)) else {
                break;
            };
            out.skip_optional_pointer |= draft.overrides.skip_optional_pointer;
            out.omit_empty = out.omit_empty.or(draft.overrides.omit_empty);
            out.nullable |= draft.nullable || matches!(draft.shape, Shape::NullableWrapper { .. });
            match &draft.shape {
                Shape::Alias { target } => current = target,
                _ => break,
            }
        }
        out
    }

    fn flatten_nullable(&self, inner: &TypeRef) -> TypeRef {
        let mut current = inner;
        for _ in 0..=self.drafts.len() {
            match current.as_schema().and_then(|p| self.draft(p)) {
                Some(Draft {
                    shape: Shape::NullableWrapper { inner },
                    ..
                }) => current = inner,
                _ => break,
            }
        }
        current.clone()
    }

    fn refine(&self, shape: &Shape, policy: &CompositionPolicy<'_>) -> Shape {
        match shape {
            Shape::NullableWrapper { inner } => Shape::NullableWrapper {
                inner: self.flatten_nullable(inner),
            },
            Shape::UnionWrapper(union) => {
                let mut seen = HashSet::new();
                let members = union
                    .members
                    .iter()
                    .filter(|m| seen.insert(self.identity(m).clone()))
                    .cloned()
                    .collect();
                Shape::UnionWrapper(UnionShape {
                    members,
                    ..union.clone()
                })
            }
            Shape::Struct(body) => {
                let fields = body
                    .fields
                    .iter()
                    .map(|field| self.finish_field(field, policy))
                    .collect();
                Shape::Struct(StructShape {
                    fields,
                    additional_properties: body.additional_properties.clone(),
                })
            }
            other => other.clone(),
        }
    }

    fn finish_field(&self, field: &Field, policy: &CompositionPolicy<'_>) -> Field {
        let traits = self.traits(&field.ty);
        let skip = field.overrides.skip_optional_pointer || traits.skip_optional_pointer;
        let forced_omit = field.overrides.omit_empty.or(traits.omit_empty);

        let mut out = field.clone();
        out.pointer = field.optional && !skip && !traits.nullable;
        out.omit_empty = forced_omit.unwrap_or(field.optional);
        out.tags = policy.tags.render(
            &TagData {
                field_name: &out.name,
                field_ident: &out.ident,
                is_optional: out.optional,
                is_pointer: out.pointer,
                omit_empty: out.omit_empty,
            },
            forced_omit,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::content_types::ContentTypeMatcher;
    use crate::oas::walk::collect_operations;
    use crate::resolver::gather::build_schema_graph;
    use crate::type_mapping::TypeSpec;
    use pretty_assertions::assert_eq;

    fn compose(yaml: &str) -> AppResult<(SchemaGraph, CodegenContext)> {
        let doc = OpenApiDocument::from_yaml_str(yaml)?;
        let sites = collect_operations(&doc)?;
        let config = ResolverConfig::default().effective();
        let matcher = ContentTypeMatcher::new(&config.content_types)?;
        let mut graph = build_schema_graph(&doc, &sites, &matcher)?;
        let tags = StructTagRenderer::new(&config.struct_tags);
        let policy = CompositionPolicy {
            mapper: &config.type_mapping,
            mangling: &config.name_mangling,
            tags: &tags,
        };
        let mut ctx = CodegenContext::new();
        resolve_compositions(&doc, &mut graph, &policy, &mut ctx)?;
        Ok((graph, ctx))
    }

    fn path(pointer: &str) -> SchemaPath {
        SchemaPath::from_pointer(pointer).unwrap()
    }

    fn shape<'g>(graph: &'g SchemaGraph, pointer: &str) -> &'g Shape {
        graph.get(&path(pointer)).unwrap().shape().unwrap()
    }

    fn field<'g>(graph: &'g SchemaGraph, pointer: &str, name: &str) -> &'g Field {
        match shape(graph, pointer) {
            Shape::Struct(body) => body.fields.iter().find(|f| f.name == name).unwrap(),
            other => panic!("expected struct at {pointer}, got {other:?}"),
        }
    }

    #[test]
    fn test_nullable_oneof_collapses_to_wrapper() {
        let (graph, ctx) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Tag:
      type: string
    Pet:
      type: object
      properties:
        owner:
          oneOf:
            - $ref: '#/components/schemas/Tag'
            - type: 'null'
        nickname:
          type: [string, 'null']
"#,
        )
        .unwrap();
        assert_eq!(
            shape(&graph, "#/components/schemas/Pet/properties/owner"),
            &Shape::NullableWrapper {
                inner: TypeRef::schema(path("#/components/schemas/Tag"))
            }
        );
        assert_eq!(
            shape(&graph, "#/components/schemas/Pet/properties/nickname"),
            &Shape::NullableWrapper {
                inner: TypeRef::Primitive(TypeSpec::new("String"))
            }
        );
        // Optional but already nullable: held by value.
        let owner = field(&graph, "#/components/schemas/Pet", "owner");
        assert!(owner.optional);
        assert!(!owner.pointer);
        assert!(ctx.has_custom_type(CUSTOM_TYPE_NULLABLE));
    }

    #[test]
    fn test_nullable_flag_on_legacy_ref_is_flattened() {
        let (graph, _) = compose(
            r#"
openapi: 3.0.3
components:
  schemas:
    Inner:
      type: string
      nullable: true
    Outer:
      anyOf:
        - $ref: '#/components/schemas/Inner'
        - type: 'null'
"#,
        )
        .unwrap();
        assert_eq!(
            shape(&graph, "#/components/schemas/Outer"),
            &Shape::NullableWrapper {
                inner: TypeRef::Primitive(TypeSpec::new("String"))
            }
        );
    }

    #[test]
    fn test_union_members_deduplicated_by_identity() {
        let (graph, ctx) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Cat:
      type: object
      properties:
        purrs:
          type: boolean
    Kitty:
      $ref: '#/components/schemas/Cat'
    Dog:
      type: object
      properties:
        barks:
          type: boolean
    Animal:
      oneOf:
        - $ref: '#/components/schemas/Cat'
        - $ref: '#/components/schemas/Kitty'
        - $ref: '#/components/schemas/Dog'
        - $ref: '#/components/schemas/Cat'
      discriminator:
        propertyName: kind
        mapping:
          cat: '#/components/schemas/Cat'
          dog: Dog
"#,
        )
        .unwrap();
        match shape(&graph, "#/components/schemas/Animal") {
            Shape::UnionWrapper(union) => {
                assert_eq!(union.kind, UnionKind::OneOf);
                assert_eq!(
                    union.members,
                    vec![
                        TypeRef::schema(path("#/components/schemas/Cat")),
                        TypeRef::schema(path("#/components/schemas/Dog")),
                    ]
                );
                let disc = union.discriminator.as_ref().unwrap();
                assert_eq!(disc.property_name, "kind");
                assert_eq!(disc.mapping["dog"], path("#/components/schemas/Dog"));
            }
            other => panic!("expected union, got {other:?}"),
        }
        assert!(ctx.has_helper(HELPER_UNION_JSON));
    }

    #[test]
    fn test_discriminator_mapping_must_resolve() {
        let err = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Cat:
      type: object
    Animal:
      oneOf:
        - $ref: '#/components/schemas/Cat'
      discriminator:
        propertyName: kind
        mapping:
          dog: '#/components/schemas/Dog'
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::DanglingRef { .. }));
    }

    #[test]
    fn test_all_of_merges_fields_and_propagates_field_directives() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Base:
      type: object
      required: [id]
      properties:
        id:
          type: string
        note:
          type: string
    Derived:
      allOf:
        - $ref: '#/components/schemas/Base'
        - type: object
          required: [extra]
          properties:
            note:
              x-codegen-skip-optional-pointer: true
            extra:
              type: integer
"#,
        )
        .unwrap();
        let names: Vec<_> = match shape(&graph, "#/components/schemas/Derived") {
            Shape::Struct(body) => body.fields.iter().map(|f| f.name.as_str()).collect(),
            other => panic!("expected struct, got {other:?}"),
        };
        assert_eq!(names, vec!["id", "note", "extra"]);

        let note = field(&graph, "#/components/schemas/Derived", "note");
        assert!(note.optional);
        assert!(!note.pointer);
        assert_eq!(
            note.ty,
            TypeRef::schema(path("#/components/schemas/Base/properties/note"))
        );
        let id = field(&graph, "#/components/schemas/Derived", "id");
        assert!(!id.optional);
        assert!(!id.pointer);
        assert!(!field(&graph, "#/components/schemas/Derived", "extra").optional);

        // Base itself is untouched.
        assert!(field(&graph, "#/components/schemas/Base", "note").pointer);
    }

    #[test]
    fn test_all_of_sibling_required_applies_to_merged_fields() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Base:
      type: object
      properties:
        id:
          type: string
        label:
          type: string
    Derived:
      allOf:
        - $ref: '#/components/schemas/Base'
      required: [id]
"#,
        )
        .unwrap();
        let id = field(&graph, "#/components/schemas/Derived", "id");
        assert!(!id.optional);
        assert!(!id.pointer);
        assert_eq!(id.tags["json"], "id");
        assert!(field(&graph, "#/components/schemas/Derived", "label").optional);
        assert!(field(&graph, "#/components/schemas/Base", "id").optional);
    }

    #[test]
    fn test_all_of_single_member_propagates_member_directives() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Id:
      type: string
      format: uuid
    Holder:
      type: object
      properties:
        wrapped:
          allOf:
            - $ref: '#/components/schemas/Id'
            - x-codegen-skip-optional-pointer: true
        plain:
          $ref: '#/components/schemas/Id'
"#,
        )
        .unwrap();
        let wrapped_path = "#/components/schemas/Holder/properties/wrapped";
        assert_eq!(
            shape(&graph, wrapped_path),
            &Shape::Alias {
                target: TypeRef::schema(path("#/components/schemas/Id"))
            }
        );
        assert!(
            graph
                .get(&path(wrapped_path))
                .unwrap()
                .overrides
                .skip_optional_pointer
        );
        assert!(!field(&graph, "#/components/schemas/Holder", "wrapped").pointer);
        assert!(field(&graph, "#/components/schemas/Holder", "plain").pointer);
    }

    #[test]
    fn test_omit_empty_override_controls_tags() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Pet:
      type: object
      required: [id]
      properties:
        id:
          type: integer
          format: int64
        name:
          type: string
        status:
          type: string
          x-codegen-omitempty: false
"#,
        )
        .unwrap();
        let id = field(&graph, "#/components/schemas/Pet", "id");
        assert_eq!(id.tags["json"], "id");
        assert!(!id.omit_empty);
        let name = field(&graph, "#/components/schemas/Pet", "name");
        assert_eq!(name.tags["json"], "name,omitempty");
        assert!(name.omit_empty);
        let status = field(&graph, "#/components/schemas/Pet", "status");
        assert_eq!(status.tags["json"], "status");
        assert!(!status.omit_empty);
        assert!(status.pointer);
    }

    #[test]
    fn test_type_override_short_circuits_inference() {
        let (graph, ctx) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Money:
      type: object
      properties:
        amount:
          type: string
      x-codegen-type:
        type: rust_decimal::Decimal
        import: rust_decimal
"#,
        )
        .unwrap();
        assert_eq!(
            shape(&graph, "#/components/schemas/Money"),
            &Shape::Alias {
                target: TypeRef::Primitive(TypeSpec::with_import(
                    "rust_decimal::Decimal",
                    "rust_decimal"
                ))
            }
        );
        assert_eq!(ctx.imports(), vec!["rust_decimal"]);
    }

    #[test]
    fn test_object_with_null_type_stays_struct() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Maybe:
      type: [object, 'null']
      properties:
        value:
          type: number
"#,
        )
        .unwrap();
        let maybe = graph.get(&path("#/components/schemas/Maybe")).unwrap();
        assert!(maybe.nullable);
        assert!(matches!(maybe.shape(), Some(Shape::Struct(_))));
    }

    #[test]
    fn test_empty_one_of_is_an_empty_union() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Nothing:
      oneOf: []
"#,
        )
        .unwrap();
        match shape(&graph, "#/components/schemas/Nothing") {
            Shape::UnionWrapper(union) => assert!(union.members.is_empty()),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_unclassifiable_schemas_are_fatal() {
        for body in [
            "Bad:\n      type: strnig",
            "Bad:\n      oneOf: {}",
            "Bad:\n      type: 42",
        ] {
            let yaml = format!("openapi: 3.1.0\ncomponents:\n  schemas:\n    {body}\n");
            match compose(&yaml) {
                Err(AppError::UnclassifiableSchema { path: at, .. }) => {
                    assert_eq!(at, path("#/components/schemas/Bad"))
                }
                other => panic!("expected unclassifiable for {body}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_arrays_and_maps() {
        let (graph, _) = compose(
            r#"
openapi: 3.1.0
components:
  schemas:
    Tags:
      type: array
      items:
        type: string
    Labels:
      type: object
      additionalProperties:
        type: string
    Free:
      type: object
"#,
        )
        .unwrap();
        assert_eq!(
            shape(&graph, "#/components/schemas/Tags"),
            &Shape::Array {
                element: TypeRef::schema(path("#/components/schemas/Tags/items"))
            }
        );
        match shape(&graph, "#/components/schemas/Labels") {
            Shape::Struct(body) => assert_eq!(
                body.additional_properties,
                Some(TypeRef::schema(path(
                    "#/components/schemas/Labels/additionalProperties"
                )))
            ),
            other => panic!("expected struct, got {other:?}"),
        }
        match shape(&graph, "#/components/schemas/Free") {
            Shape::Struct(body) => assert_eq!(body.additional_properties, Some(TypeRef::Any)),
            other => panic!("expected struct, got {other:?}"),
        }
    }
}
