#![deny(missing_docs)]

//! # Name Resolver
//!
//! Assigns the final identifier of every descriptor and the mangled id of every
//! operation.
//!
//! Each descriptor has an ordered list of candidate names (tiers). Within one
//! naming scope, an entry whose candidate collides moves to its next tier; an entry
//! that still collides on its last tier gets a numeric suffix. Suffixes are
//! symmetric: every member of the colliding group is numbered, starting at `1`, in
//! visitation order.
//!
//! Descriptors are named level by level (by nesting depth) so that a parent's final
//! name is known before its children derive theirs from it. Explicit type-name
//! overrides are placed before anything else.

use crate::content_types::ContentTypeMatcher;
use crate::error::{AppError, AppResult};
use crate::mangle::NameMangling;
use crate::model::graph::SchemaGraph;
use crate::model::schema::{NestedRole, Origin, ParamOwner, SchemaDescriptor, Section};
use crate::oas::pointer::SchemaPath;
use crate::oas::walk::OperationSite;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Numbered variants of `base` that are not taken yet, marking them taken.
fn suffixed(base: &str, count: usize, taken: &mut HashSet<String>) -> Vec<String> {
    let mut names = Vec::with_capacity(count);
    let mut n = 1;
    while names.len() < count {
        let name = format!("{}{}", base, n);
        n += 1;
        if taken.insert(name.clone()) {
            names.push(name);
        }
    }
    names
}

/// Mangled ids for the operation walk, index-aligned with `sites`.
///
/// `createOrder` and a derived `create_order` both mangle to `CreateOrder` and
/// become `CreateOrder1` and `CreateOrder2`.
pub fn mangle_operation_ids(sites: &[OperationSite<'_>], mangling: &NameMangling) -> Vec<String> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, site) in sites.iter().enumerate() {
        groups
            .entry(mangling.type_name(&site.operation_id))
            .or_default()
            .push(i);
    }

    let mut out = vec![String::new(); sites.len()];
    let mut taken = HashSet::new();
    for (name, members) in &groups {
        if let [only] = members.as_slice() {
            taken.insert(name.clone());
            out[*only] = name.clone();
        }
    }
    for (name, members) in &groups {
        if members.len() < 2 {
            continue;
        }
        tracing::debug!(%name, count = members.len(), "operation ids collide");
        for (i, numbered) in members.iter().zip(suffixed(name, members.len(), &mut taken)) {
            out[*i] = numbered;
        }
    }
    out
}

/// Assigns a final name to every descriptor of `graph`.
///
/// `operation_ids` are the mangled ids from [`mangle_operation_ids`].
pub fn resolve_names(
    graph: &mut SchemaGraph,
    operation_ids: &[String],
    mangling: &NameMangling,
    matcher: &ContentTypeMatcher,
) -> AppResult<()> {
    let namer = Namer {
        mangling,
        matcher,
        operation_ids,
    };
    let mut assigned: Vec<Option<String>> = vec![None; graph.len()];
    let mut taken: HashMap<Section, HashSet<String>> = HashMap::new();

    // 1. Overrides
    let mut overridden: HashMap<(Section, &str), &SchemaPath> = HashMap::new();
    for (i, descriptor) in graph.iter().enumerate() {
        let Some(name) = descriptor.overrides.type_name.as_deref() else {
            continue;
        };
        if let Some(first) = overridden.insert((descriptor.scope, name), &descriptor.path) {
            return Err(AppError::OverrideCollision {
                name: name.to_string(),
                first: first.clone(),
                second: descriptor.path.clone(),
            });
        }
        taken
            .entry(descriptor.scope)
            .or_default()
            .insert(name.to_string());
        assigned[i] = Some(name.to_string());
    }

    // 2. Inferred names, shallowest first. Within a level, schemas declared under
    // `components/schemas` claim names before roots only reached by reference.
    let max_depth = graph.iter().map(|d| d.depth).max().unwrap_or(0);
    for depth in 0..=max_depth {
        for declared in [true, false] {
            let mut level: Vec<Pending> = graph
                .iter()
                .enumerate()
                .filter(|(i, d)| {
                    d.depth == depth
                        && assigned[*i].is_none()
                        && is_declared_component(d) == declared
                })
                .map(|(i, d)| Pending {
                    index: i,
                    scope: d.scope,
                    tiers: namer.tiers(d, parent_name(graph, &assigned, d)),
                    tier: 0,
                })
                .collect();
            resolve_level(&mut level, &mut taken, &mut assigned);
        }
    }

    // 3. Commit
    for (i, name) in assigned.into_iter().enumerate() {
        let descriptor = graph
            .by_index_mut(i)
            .ok_or_else(|| AppError::General(format!("descriptor {} vanished", i)))?;
        let name = name.ok_or_else(|| {
            AppError::General(format!("no name resolved for {}", descriptor.path))
        })?;
        descriptor.set_final_name(name)?;
    }

    tracing::debug!(descriptors = graph.len(), "names resolved");
    Ok(())
}

fn is_declared_component(descriptor: &SchemaDescriptor) -> bool {
    matches!(descriptor.origin, Origin::Component { .. }) && descriptor.path.is_component_schema()
}

fn parent_name<'a>(
    graph: &SchemaGraph,
    assigned: &'a [Option<String>],
    descriptor: &SchemaDescriptor,
) -> Option<&'a str> {
    match &descriptor.origin {
        Origin::Nested { parent, .. } => graph
            .position(parent)
            .and_then(|i| assigned.get(i))
            .and_then(|n| n.as_deref()),
        _ => None,
    }
}

#[derive(Debug)]
struct Pending {
    index: usize,
    scope: Section,
    tiers: Vec<String>,
    tier: usize,
}

impl Pending {
    fn candidate(&self) -> &str {
        &self.tiers[self.tier]
    }

    fn is_last_tier(&self) -> bool {
        self.tier + 1 >= self.tiers.len()
    }
}

fn resolve_level(
    level: &mut [Pending],
    taken: &mut HashMap<Section, HashSet<String>>,
    assigned: &mut [Option<String>],
) {
    loop {
        let mut groups: IndexMap<(Section, String), Vec<usize>> = IndexMap::new();
        for (k, entry) in level.iter().enumerate() {
            if assigned[entry.index].is_none() {
                groups
                    .entry((entry.scope, entry.candidate().to_string()))
                    .or_default()
                    .push(k);
            }
        }
        if groups.is_empty() {
            return;
        }

        // Free candidates are claimed before any suffix is handed out.
        for ((scope, name), members) in &groups {
            let scope_taken = taken.entry(*scope).or_default();
            if let [only] = members.as_slice() {
                if scope_taken.insert(name.clone()) {
                    assigned[level[*only].index] = Some(name.clone());
                }
            }
        }

        for ((scope, name), members) in &groups {
            let mut last_tier = Vec::new();
            for &k in members {
                let entry = &mut level[k];
                if assigned[entry.index].is_some() {
                    continue;
                }
                if entry.is_last_tier() {
                    last_tier.push(entry.index);
                } else {
                    entry.tier += 1;
                }
            }
            if last_tier.is_empty() {
                continue;
            }
            tracing::trace!(%name, count = last_tier.len(), "numbering colliding names");
            let scope_taken = taken.entry(*scope).or_default();
            for (index, numbered) in last_tier
                .iter()
                .zip(suffixed(name, last_tier.len(), scope_taken))
            {
                assigned[*index] = Some(numbered);
            }
        }
    }
}

struct Namer<'a> {
    mangling: &'a NameMangling,
    matcher: &'a ContentTypeMatcher,
    operation_ids: &'a [String],
}

impl Namer<'_> {
    /// Candidate names, best first.
    fn tiers(&self, descriptor: &SchemaDescriptor, parent: Option<&str>) -> Vec<String> {
        let m = self.mangling;
        match &descriptor.origin {
            Origin::Component { name } if descriptor.path.is_component_schema() => {
                vec![m.type_name(name)]
            }
            Origin::Component { name } => {
                // Reference-only roots, e.g. `#/components/schemas/Pet/$defs/Color`.
                let mut tiers = vec![m.type_name(name)];
                let schemas = SchemaPath::from_segments(["components", "schemas"]);
                if descriptor.path.starts_with(&schemas) && descriptor.path.len() > 3 {
                    let owner = &descriptor.path.segments()[2];
                    tiers.push(format!("{}{}", m.type_name(owner), m.type_part(name)));
                }
                tiers.push(self.stable_name(&descriptor.path));
                tiers
            }
            Origin::RequestBody {
                operation,
                operation_id,
                content_type,
                item,
            } => {
                let role = if *item { "RequestItem" } else { "Request" };
                vec![format!(
                    "{}{}{}",
                    self.operation(*operation, operation_id),
                    self.matcher.short_name(content_type, m),
                    role
                )]
            }
            Origin::Response {
                operation,
                operation_id,
                status,
                content_type,
                item,
            } => {
                let role = if *item { "ResponseItem" } else { "Response" };
                let base = format!(
                    "{}{}{}",
                    self.operation(*operation, operation_id),
                    self.matcher.short_name(content_type, m),
                    role
                );
                vec![base.clone(), format!("{}{}", base, status_token(status))]
            }
            Origin::Parameter {
                owner,
                name,
                location,
            } => {
                let owner = match owner {
                    ParamOwner::Operation {
                        index,
                        operation_id,
                    } => self.operation(*index, operation_id),
                    ParamOwner::PathItem { template } => {
                        let token = m.type_part(template);
                        if token.is_empty() {
                            "Root".to_string()
                        } else {
                            token
                        }
                    }
                };
                let param = m.type_part(name);
                vec![
                    format!("{}{}Parameter", owner, param),
                    format!("{}{}{}Parameter", owner, param, location.token()),
                ]
            }
            Origin::Nested { role, .. } => {
                let stable = self.stable_name(&descriptor.path);
                match parent {
                    Some(parent) => vec![format!("{}{}", parent, self.role(role)), stable],
                    None => vec![stable],
                }
            }
        }
    }

    fn operation(&self, index: usize, operation_id: &str) -> String {
        self.operation_ids
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.mangling.type_name(operation_id))
    }

    fn role(&self, role: &NestedRole) -> String {
        match role {
            NestedRole::Property(name) => {
                let part = self.mangling.type_part(name);
                if part.is_empty() {
                    "Property".to_string()
                } else {
                    part
                }
            }
            NestedRole::Items => "Item".to_string(),
            NestedRole::AdditionalProperties => "Value".to_string(),
            NestedRole::OneOf(i) => format!("OneOf{}", i + 1),
            NestedRole::AnyOf(i) => format!("AnyOf{}", i + 1),
            NestedRole::AllOf(i) => format!("AllOf{}", i + 1),
        }
    }

    /// Name spelled from the structural path; unique per path up to mangling.
    fn stable_name(&self, path: &SchemaPath) -> String {
        self.mangling.type_name(&path.segments().join("_"))
    }
}

fn status_token(status: &str) -> String {
    if status == "default" {
        "Default".to_string()
    } else {
        status.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_types::ContentTypes;
    use crate::oas::document::OpenApiDocument;
    use crate::oas::walk::collect_operations;
    use crate::resolver::gather::build_schema_graph;
    use pretty_assertions::assert_eq;

    fn named(yaml: &str) -> AppResult<(SchemaGraph, Vec<String>)> {
        let doc = OpenApiDocument::from_yaml_str(yaml)?;
        let sites = collect_operations(&doc)?;
        let mangling = NameMangling::default();
        let matcher = ContentTypeMatcher::new(&ContentTypes::default())?;
        let mut graph = build_schema_graph(&doc, &sites, &matcher)?;
        let ids = mangle_operation_ids(&sites, &mangling);
        resolve_names(&mut graph, &ids, &mangling, &matcher)?;
        Ok((graph, ids))
    }

    fn names(graph: &SchemaGraph) -> Vec<(String, String)> {
        graph
            .iter()
            .map(|d| {
                (
                    d.path.to_pointer(),
                    d.final_name().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn name_of<'g>(graph: &'g SchemaGraph, pointer: &str) -> &'g str {
        graph
            .get(&SchemaPath::from_pointer(pointer).unwrap())
            .and_then(SchemaDescriptor::final_name)
            .unwrap()
    }

    #[test]
    fn test_components_keep_bare_names() {
        let (graph, _) = named(
            r#"
openapi: 3.1.0
paths:
  /foo:
    post:
      operationId: postFoo
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name:
                  type: string
      responses: {}
components:
  schemas:
    Bar:
      type: object
      properties:
        name:
          type: string
    PostFooJSONRequest:
      type: string
"#,
        )
        .unwrap();
        assert_eq!(
            names(&graph),
            vec![
                ("#/components/schemas/Bar".to_string(), "Bar".to_string()),
                (
                    "#/components/schemas/Bar/properties/name".to_string(),
                    "BarName".to_string()
                ),
                (
                    "#/components/schemas/PostFooJSONRequest".to_string(),
                    "PostFooJSONRequest".to_string()
                ),
                (
                    "#/paths/~1foo/post/requestBody/content/application~1json/schema".to_string(),
                    "PostFooJSONRequest".to_string()
                ),
                (
                    "#/paths/~1foo/post/requestBody/content/application~1json/schema/properties/name"
                        .to_string(),
                    "PostFooJSONRequestName".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_colliding_content_types_are_numbered_symmetrically() {
        let (graph, _) = named(
            r#"
openapi: 3.1.0
paths:
  /orders:
    post:
      operationId: createOrder
      requestBody:
        content:
          application/json:
            schema:
              type: object
          application/merge-patch+json:
            schema:
              type: object
          application/json-patch+json:
            schema:
              type: array
      responses: {}
"#,
        )
        .unwrap();
        let got: Vec<String> = names(&graph).into_iter().map(|(_, n)| n).collect();
        assert_eq!(
            got,
            vec![
                "CreateOrderJSONRequest1",
                "CreateOrderJSONRequest2",
                "CreateOrderJSONRequest3"
            ]
        );
    }

    #[test]
    fn test_responses_fall_back_to_status_tier() {
        let (graph, _) = named(
            r#"
openapi: 3.1.0
paths:
  /resource:
    patch:
      operationId: patchResource
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: object
            application/merge-patch+json:
              schema:
                type: object
        '201':
          description: created
          content:
            application/json:
              schema:
                type: object
        default:
          description: error
          content:
            text/plain:
              schema:
                type: string
"#,
        )
        .unwrap();
        let got: Vec<String> = names(&graph).into_iter().map(|(_, n)| n).collect();
        assert_eq!(
            got,
            vec![
                "PatchResourceJSONResponse2001",
                "PatchResourceJSONResponse2002",
                "PatchResourceJSONResponse201",
                "PatchResourceTextResponse",
            ]
        );
    }

    #[test]
    fn test_type_name_override_is_verbatim() {
        let (graph, _) = named(
            r#"
openapi: 3.1.0
components:
  schemas:
    Qux:
      type: object
      x-codegen-type-name: CustomQux
      properties:
        id:
          type: string
"#,
        )
        .unwrap();
        assert_eq!(name_of(&graph, "#/components/schemas/Qux"), "CustomQux");
        assert_eq!(
            name_of(&graph, "#/components/schemas/Qux/properties/id"),
            "CustomQuxID"
        );
    }

    #[test]
    fn test_reference_only_roots_yield_to_components() {
        let (graph, _) = named(
            r##"
openapi: 3.1.0
components:
  schemas:
    Pet:
      type: object
      $defs:
        Color:
          type: string
        Size:
          type: integer
      properties:
        color:
          $ref: '#/components/schemas/Pet/$defs/Color'
        size:
          $ref: '#/components/schemas/Pet/$defs/Size'
    Color:
      type: string
"##,
        )
        .unwrap();
        assert_eq!(name_of(&graph, "#/components/schemas/Color"), "Color");
        assert_eq!(
            name_of(&graph, "#/components/schemas/Pet/$defs/Color"),
            "PetColor"
        );
        assert_eq!(name_of(&graph, "#/components/schemas/Pet/$defs/Size"), "Size");
        assert_eq!(name_of(&graph, "#/components/schemas/Pet"), "Pet");
    }

    #[test]
    fn test_override_collision_is_fatal() {
        let err = named(
            r#"
openapi: 3.1.0
components:
  schemas:
    A:
      type: string
      x-codegen-type-name: Same
    B:
      type: string
      x-codegen-type-name: Same
"#,
        )
        .unwrap_err();
        match err {
            AppError::OverrideCollision {
                name,
                first,
                second,
            } => {
                assert_eq!(name, "Same");
                assert_eq!(first.to_pointer(), "#/components/schemas/A");
                assert_eq!(second.to_pointer(), "#/components/schemas/B");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_nested_name_yields_to_component() {
        let (graph, _) = named(
            r#"
openapi: 3.1.0
components:
  schemas:
    Pet:
      type: object
      properties:
        owner:
          type: object
        tags:
          type: array
          items:
            type: string
    PetOwner:
      type: string
"#,
        )
        .unwrap();
        assert_eq!(name_of(&graph, "#/components/schemas/PetOwner"), "PetOwner");
        assert_eq!(
            name_of(&graph, "#/components/schemas/Pet/properties/owner"),
            "ComponentsSchemasPetPropertiesOwner"
        );
        assert_eq!(
            name_of(&graph, "#/components/schemas/Pet/properties/tags/items"),
            "PetTagsItem"
        );
    }

    #[test]
    fn test_parameter_names_use_location_tier() {
        let (graph, _) = named(
            r#"
openapi: 3.1.0
paths:
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema:
          type: string
    get:
      operationId: getPet
      parameters:
        - name: id
          in: query
          schema:
            type: string
        - name: id
          in: header
          schema:
            type: string
        - name: limit
          in: query
          schema:
            type: integer
      responses: {}
"#,
        )
        .unwrap();
        let got: Vec<String> = names(&graph).into_iter().map(|(_, n)| n).collect();
        assert_eq!(
            got,
            vec![
                "PetsPetIDPetIDParameter",
                "GetPetIDQueryParameter",
                "GetPetIDHeaderParameter",
                "GetPetLimitParameter",
            ]
        );
    }

    #[test]
    fn test_operation_ids_are_numbered_symmetrically() {
        let (_, ids) = named(
            r#"
openapi: 3.1.0
paths:
  /users:
    get:
      operationId: getUsers
      responses: {}
    post:
      operationId: get_users
      responses: {}
  /users/{id}:
    get:
      responses: {}
"#,
        )
        .unwrap();
        assert_eq!(ids, vec!["GetUsers1", "GetUsers2", "GetUsersID"]);
    }

    #[test]
    fn test_names_are_deterministic() {
        let yaml = r#"
openapi: 3.1.0
paths:
  /a:
    post:
      operationId: a
      requestBody:
        content:
          application/json:
            schema:
              oneOf:
                - type: object
                - type: object
          application/vnd.api+json:
            schema:
              type: object
      responses: {}
components:
  schemas:
    A:
      type: object
"#;
        let (first, _) = named(yaml).unwrap();
        let (second, _) = named(yaml).unwrap();
        assert_eq!(names(&first), names(&second));
        assert!(names(&first).iter().all(|(_, n)| !n.is_empty()));
    }
}
