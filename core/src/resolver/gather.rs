#![deny(missing_docs)]

//! # Schema Graph Builder
//!
//! Walks the document once and creates a `SchemaDescriptor` for every schema
//! occurrence: component schemas, parameter schemas, request body and response
//! content schemas (and their `itemSchema`), and everything nested below them.
//!
//! - A `$ref` never creates a descriptor of its own; it binds to the target's path.
//!   Named component roots are the exception, since the name belongs to them.
//! - Reusable bodies, responses and parameters are keyed by where they are declared,
//!   so sharing them does not duplicate descriptors.
//! - Literal `{type: "null"}` composition branches are markers, not descriptors.
//!
//! No shape or naming decisions are made here.

use crate::content_types::ContentTypeMatcher;
use crate::error::AppResult;
use crate::model::graph::SchemaGraph;
use crate::model::schema::{
    NestedRole, Origin, Overrides, ParamLocation, ParamOwner, SchemaDescriptor, Section,
};
use crate::oas::document::{ref_target, OpenApiDocument};
use crate::oas::pointer::SchemaPath;
use crate::oas::walk::OperationSite;
use serde_json::Value;

/// Whether a composition branch is the literal `null` type.
pub(crate) fn is_null_schema(node: &Value) -> bool {
    let Some(map) = node.as_object() else {
        return false;
    };
    let type_is_null = match map.get("type") {
        Some(Value::String(t)) => t == "null",
        Some(Value::Array(types)) => types.len() == 1 && types[0].as_str() == Some("null"),
        _ => false,
    };
    type_is_null
        && map
            .keys()
            .all(|k| matches!(k.as_str(), "type" | "description" | "title") || k.starts_with("x-"))
}

#[derive(Debug, Clone)]
struct Visit {
    section: Section,
    scope: Section,
    origin: Origin,
    depth: usize,
}

impl Visit {
    fn root(section: Section, origin: Origin) -> Self {
        Self {
            section,
            scope: section,
            origin,
            depth: 0,
        }
    }

    fn nested(&self, parent: &SchemaPath, role: NestedRole) -> Self {
        Self {
            section: Section::Inline,
            scope: self.scope,
            origin: Origin::Nested {
                parent: parent.clone(),
                role,
            },
            depth: self.depth + 1,
        }
    }
}

/// Builds the schema graph for a document.
///
/// `sites` is the operation walk (see [`crate::oas::walk::collect_operations`]).
pub fn build_schema_graph(
    doc: &OpenApiDocument,
    sites: &[OperationSite<'_>],
    matcher: &ContentTypeMatcher,
) -> AppResult<SchemaGraph> {
    let mut builder = GraphBuilder {
        doc,
        matcher,
        graph: SchemaGraph::new(),
        ref_targets: Vec::new(),
    };

    // 1. Components
    if let Some(schemas) = doc
        .root()
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
    {
        let base = SchemaPath::from_segments(["components", "schemas"]);
        for (name, node) in schemas {
            let visit = Visit::root(
                Section::ComponentSchema,
                Origin::Component { name: name.clone() },
            );
            builder.component_root(node, base.join(name.as_str()), visit)?;
        }
    }

    // 2. Operations, in walk order
    for (index, site) in sites.iter().enumerate() {
        builder.operation(index, site)?;
    }

    // 3. Reference targets nothing else reached (e.g. `$defs`)
    let mut i = 0;
    while i < builder.ref_targets.len() {
        let target = builder.ref_targets[i].clone();
        i += 1;
        if builder.graph.contains(&target) {
            continue;
        }
        if let Some(node) = doc.node(&target) {
            let name = target.last().unwrap_or_default().to_string();
            let visit = Visit::root(Section::ComponentSchema, Origin::Component { name });
            builder.component_root(node, target, visit)?;
        }
    }

    tracing::debug!(descriptors = builder.graph.len(), "schema graph built");
    Ok(builder.graph)
}

struct GraphBuilder<'a> {
    doc: &'a OpenApiDocument,
    matcher: &'a ContentTypeMatcher,
    graph: SchemaGraph,
    ref_targets: Vec<SchemaPath>,
}

impl<'a> GraphBuilder<'a> {
    fn component_root(&mut self, node: &'a Value, at: SchemaPath, visit: Visit) -> AppResult<()> {
        if let Some(reference) = ref_target(node) {
            // Validate eagerly so the error points at the component.
            let located = self.doc.locate(node, &at)?;
            tracing::trace!(%at, reference, "component is a reference");
            self.ref_targets.push(located.path);
            self.create(node, at, visit);
            return Ok(());
        }
        self.schema(node, at, visit)
    }

    fn create(&mut self, node: &Value, at: SchemaPath, visit: Visit) -> bool {
        let mut descriptor = SchemaDescriptor::new(at, visit.section, visit.scope, visit.origin);
        descriptor.depth = visit.depth;
        descriptor.overrides = Overrides::from_schema(node, &descriptor.path);
        descriptor.description = node
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        descriptor.deprecated = node
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        descriptor.enum_values = node
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        self.graph.insert(descriptor)
    }

    /// Visits a schema position. References are recorded, not descended into.
    fn schema(&mut self, node: &'a Value, at: SchemaPath, visit: Visit) -> AppResult<()> {
        if ref_target(node).is_some() {
            let located = self.doc.locate(node, &at)?;
            self.ref_targets.push(located.path);
            return Ok(());
        }
        if !self.create(node, at.clone(), visit.clone()) {
            return Ok(());
        }
        let Some(map) = node.as_object() else {
            return Ok(());
        };

        if let Some(props) = map.get("properties").and_then(Value::as_object) {
            let base = at.join("properties");
            for (name, prop) in props {
                let child = visit.nested(&at, NestedRole::Property(name.clone()));
                self.schema(prop, base.join(name.as_str()), child)?;
            }
        }
        if let Some(items) = map.get("items").filter(|v| v.is_object()) {
            self.schema(items, at.join("items"), visit.nested(&at, NestedRole::Items))?;
        }
        if let Some(extra) = map.get("additionalProperties").filter(|v| v.is_object()) {
            let child = visit.nested(&at, NestedRole::AdditionalProperties);
            self.schema(extra, at.join("additionalProperties"), child)?;
        }
        for keyword in ["oneOf", "anyOf", "allOf"] {
            let Some(members) = map.get(keyword).and_then(Value::as_array) else {
                continue;
            };
            let base = at.join(keyword);
            for (i, member) in members.iter().enumerate() {
                if is_null_schema(member) {
                    continue;
                }
                let role = match keyword {
                    "oneOf" => NestedRole::OneOf(i),
                    "anyOf" => NestedRole::AnyOf(i),
                    _ => NestedRole::AllOf(i),
                };
                self.schema(member, base.join(i.to_string()), visit.nested(&at, role))?;
            }
        }
        Ok(())
    }

    fn operation(&mut self, index: usize, site: &OperationSite<'a>) -> AppResult<()> {
        let doc = self.doc;
        // 1. Parameters (path item level, then operation level)
        let item_owner = ParamOwner::PathItem {
            template: site.path_template.clone(),
        };
        self.parameters(site.path_item, &site.path_item_path, &item_owner)?;
        let op_owner = ParamOwner::Operation {
            index,
            operation_id: site.operation_id.clone(),
        };
        self.parameters(site.node, &site.path, &op_owner)?;

        // 2. Request body
        if let Some(body) = site.node.get("requestBody") {
            let located = doc.locate(body, &site.path.join("requestBody"))?;
            let operation_id = site.operation_id.clone();
            self.content(
                located.node,
                &located.path,
                |content_type, item| Origin::RequestBody {
                    operation: index,
                    operation_id: operation_id.clone(),
                    content_type: content_type.to_string(),
                    item,
                },
                Section::RequestBody,
            )?;
        }

        // 3. Responses
        if let Some(responses) = site.node.get("responses").and_then(Value::as_object) {
            let base = site.path.join("responses");
            for (status, response) in responses {
                if status.starts_with("x-") {
                    continue;
                }
                let located = doc.locate(response, &base.join(status.as_str()))?;
                let operation_id = site.operation_id.clone();
                self.content(
                    located.node,
                    &located.path,
                    |content_type, item| Origin::Response {
                        operation: index,
                        operation_id: operation_id.clone(),
                        status: status.clone(),
                        content_type: content_type.to_string(),
                        item,
                    },
                    Section::Response,
                )?;
            }
        }

        Ok(())
    }

    fn parameters(
        &mut self,
        owner_node: &'a Value,
        owner_path: &SchemaPath,
        owner: &ParamOwner,
    ) -> AppResult<()> {
        let Some(params) = owner_node.get("parameters").and_then(Value::as_array) else {
            return Ok(());
        };
        let doc = self.doc;
        let base = owner_path.join("parameters");
        for (i, param) in params.iter().enumerate() {
            let located = doc.locate(param, &base.join(i.to_string()))?;
            let (Some(name), Some(location)) = (
                located.node.get("name").and_then(Value::as_str),
                located
                    .node
                    .get("in")
                    .and_then(Value::as_str)
                    .and_then(ParamLocation::parse),
            ) else {
                continue;
            };
            let origin = Origin::Parameter {
                owner: owner.clone(),
                name: name.to_string(),
                location,
            };
            if let Some(schema) = located.node.get("schema") {
                self.schema(
                    schema,
                    located.path.join("schema"),
                    Visit::root(Section::Parameter, origin),
                )?;
            } else if let Some((content_type, media)) = located
                .node
                .get("content")
                .and_then(Value::as_object)
                .and_then(|c| c.iter().next())
            {
                if let Some(schema) = media.get("schema") {
                    let at = located
                        .path
                        .join("content")
                        .join(content_type.as_str())
                        .join("schema");
                    self.schema(schema, at, Visit::root(Section::Parameter, origin))?;
                }
            }
        }
        Ok(())
    }

    fn content<F>(
        &mut self,
        owner: &'a Value,
        owner_path: &SchemaPath,
        origin: F,
        section: Section,
    ) -> AppResult<()>
    where
        F: Fn(&str, bool) -> Origin,
    {
        let Some(content) = owner.get("content").and_then(Value::as_object) else {
            return Ok(());
        };
        let base = owner_path.join("content");
        for (content_type, media) in content {
            if !self.matcher.is_gathered(content_type) {
                tracing::trace!(%content_type, "content type not gathered");
                continue;
            }
            let media_path = base.join(content_type.as_str());
            if let Some(schema) = media.get("schema") {
                let visit = Visit::root(section, origin(content_type, false));
                self.schema(schema, media_path.join("schema"), visit)?;
            }
            if self.matcher.is_sequential(content_type) {
                if let Some(item) = media.get("itemSchema") {
                    let visit = Visit::root(section, origin(content_type, true));
                    self.schema(item, media_path.join("itemSchema"), visit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_types::ContentTypes;
    use crate::oas::walk::collect_operations;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gather(yaml: &str) -> AppResult<SchemaGraph> {
        let doc = OpenApiDocument::from_yaml_str(yaml)?;
        let sites = collect_operations(&doc)?;
        let matcher = ContentTypeMatcher::new(&ContentTypes::default())?;
        build_schema_graph(&doc, &sites, &matcher)
    }

    fn pointers(graph: &SchemaGraph) -> Vec<String> {
        graph.iter().map(|d| d.path.to_pointer()).collect()
    }

    #[test]
    fn test_null_schema_detection() {
        assert!(is_null_schema(&json!({"type": "null"})));
        assert!(is_null_schema(&json!({"type": ["null"], "description": "nothing"})));
        assert!(!is_null_schema(&json!({"type": ["string", "null"]})));
        assert!(!is_null_schema(&json!({"type": "null", "enum": [null]})));
    }

    #[test]
    fn test_components_and_nested_in_declaration_order() {
        let graph = gather(
            r#"
openapi: 3.1.0
components:
  schemas:
    Pet:
      type: object
      properties:
        id:
          type: integer
        tags:
          type: array
          items:
            $ref: '#/components/schemas/Tag'
        owner:
          oneOf:
            - $ref: '#/components/schemas/Tag'
            - type: 'null'
    Tag:
      type: string
"#,
        )
        .unwrap();
        assert_eq!(
            pointers(&graph),
            vec![
                "#/components/schemas/Pet",
                "#/components/schemas/Pet/properties/id",
                "#/components/schemas/Pet/properties/tags",
                "#/components/schemas/Pet/properties/owner",
                "#/components/schemas/Tag",
            ]
        );
        let id = graph
            .get(&SchemaPath::from_pointer("#/components/schemas/Pet/properties/id").unwrap())
            .unwrap();
        assert_eq!(id.section, Section::Inline);
        assert_eq!(id.scope, Section::ComponentSchema);
        assert_eq!(id.depth, 1);
    }

    #[test]
    fn test_shared_request_body_is_visited_once() {
        let graph = gather(
            r#"
openapi: 3.0.3
paths:
  /a:
    post:
      operationId: createA
      requestBody:
        $ref: '#/components/requestBodies/Shared'
      responses: {}
  /b:
    post:
      operationId: createB
      requestBody:
        $ref: '#/components/requestBodies/Shared'
      responses: {}
components:
  requestBodies:
    Shared:
      content:
        application/json:
          schema:
            type: object
            properties:
              name:
                type: string
"#,
        )
        .unwrap();
        assert_eq!(graph.len(), 2);
        let root = graph.iter().next().unwrap();
        assert_eq!(
            root.path.to_pointer(),
            "#/components/requestBodies/Shared/content/application~1json/schema"
        );
        match &root.origin {
            Origin::RequestBody { operation_id, .. } => assert_eq!(operation_id, "createA"),
            other => panic!("unexpected origin {other:?}"),
        }
    }

    #[test]
    fn test_item_schema_is_independent_of_envelope() {
        let graph = gather(
            r#"
openapi: 3.2.0
paths:
  /events:
    get:
      operationId: streamEvents
      responses:
        '200':
          description: events
          content:
            text/event-stream:
              schema:
                type: string
              itemSchema:
                type: object
                properties:
                  data:
                    type: string
            application/octet-stream:
              schema:
                type: string
                format: binary
"#,
        )
        .unwrap();
        let sections: Vec<_> = graph
            .iter()
            .map(|d| (d.path.last().unwrap_or_default().to_string(), d.section))
            .collect();
        assert_eq!(
            sections,
            vec![
                ("schema".to_string(), Section::Response),
                ("itemSchema".to_string(), Section::Response),
                ("data".to_string(), Section::Inline),
            ]
        );
    }

    #[test]
    fn test_dangling_ref_is_fatal() {
        let err = gather(
            r#"
openapi: 3.0.3
components:
  schemas:
    Pet:
      properties:
        owner:
          $ref: '#/components/schemas/Person'
"#,
        )
        .unwrap_err();
        match err {
            crate::error::AppError::DanglingRef { path, .. } => {
                assert_eq!(path.to_pointer(), "#/components/schemas/Pet/properties/owner")
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_defs_targets_become_roots() {
        let graph = gather(
            r##"
openapi: 3.1.0
components:
  schemas:
    Pet:
      $defs:
        Color:
          type: string
      properties:
        color:
          $ref: '#/components/schemas/Pet/$defs/Color'
"##,
        )
        .unwrap();
        let color = graph
            .get(&SchemaPath::from_pointer("#/components/schemas/Pet/$defs/Color").unwrap())
            .unwrap();
        assert_eq!(color.raw_name.as_deref(), Some("Color"));
        assert_eq!(color.section, Section::ComponentSchema);
    }
}
