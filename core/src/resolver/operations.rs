#![deny(missing_docs)]

//! # Operation Descriptor Builder
//!
//! Builds one `OperationDescriptor` per operation of the walk, binding parameters,
//! bodies and responses to the already named schema descriptors by path.
//!
//! - Operation-level parameters replace path-item-level ones with the same name
//!   and location.
//! - Path parameters follow the order of the path template.
//! - Sequential media types bind the `schema` as the envelope and `itemSchema` as
//!   a separate per-item descriptor.
//!
//! Nothing here is fatal beyond reference errors; unusable content simply makes
//! the operation non-simple.

use crate::content_types::ContentTypeMatcher;
use crate::context::{CodegenContext, HELPER_MARSHAL_FORM, HELPER_STREAM_ITEMS};
use crate::error::AppResult;
use crate::mangle::NameMangling;
use crate::model::graph::SchemaGraph;
use crate::model::operation::{
    is_simple_operation, ContentDescriptor, ItemSchemaBinding, OperationDescriptor,
    ParameterDescriptor, RequestBodyDescriptor, ResponseDescriptor,
};
use crate::model::schema::ParamLocation;
use crate::oas::document::OpenApiDocument;
use crate::oas::pointer::SchemaPath;
use crate::oas::walk::OperationSite;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

/// Names of the `{placeholders}` of a path template, in order.
pub fn path_placeholders(template: &str) -> Vec<String> {
    let re = PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([^}]+)}").expect("Invalid regex"));
    re.captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Default style per location: `form` for query and cookie, `simple` otherwise.
fn resolve_style(explicit: Option<&str>, location: ParamLocation) -> String {
    if let Some(style) = explicit {
        return style.to_string();
    }
    match location {
        ParamLocation::Query | ParamLocation::Cookie => "form".to_string(),
        ParamLocation::Path | ParamLocation::Header => "simple".to_string(),
    }
}

/// Explode defaults to true for `form` and `cookie` styles.
fn resolve_explode(explicit: Option<bool>, style: &str) -> bool {
    explicit.unwrap_or(matches!(style, "form" | "cookie"))
}

/// Builds all operation descriptors, index-aligned with `sites`.
pub fn build_operations(
    doc: &OpenApiDocument,
    sites: &[OperationSite<'_>],
    graph: &SchemaGraph,
    mangled_ids: &[String],
    matcher: &ContentTypeMatcher,
    mangling: &NameMangling,
    ctx: &mut CodegenContext,
) -> AppResult<Vec<OperationDescriptor>> {
    let mut builder = OperationBuilder {
        doc,
        graph,
        matcher,
        mangling,
        ctx,
    };
    let operations = sites
        .iter()
        .enumerate()
        .map(|(i, site)| {
            let mangled_id = mangled_ids
                .get(i)
                .cloned()
                .unwrap_or_else(|| mangling.type_name(&site.operation_id));
            builder.operation(site, mangled_id)
        })
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(
        operations = operations.len(),
        simple = operations.iter().filter(|o| o.simple).count(),
        "operations built"
    );
    Ok(operations)
}

struct OperationBuilder<'a> {
    doc: &'a OpenApiDocument,
    graph: &'a SchemaGraph,
    matcher: &'a ContentTypeMatcher,
    mangling: &'a NameMangling,
    ctx: &'a mut CodegenContext,
}

impl OperationBuilder<'_> {
    fn operation(
        &mut self,
        site: &OperationSite<'_>,
        mangled_id: String,
    ) -> AppResult<OperationDescriptor> {
        let doc = self.doc;

        // 1. Parameters, operation level replacing path-item level
        let mut params: IndexMap<(String, ParamLocation), ParameterDescriptor> = IndexMap::new();
        for (owner, owner_path) in [
            (site.path_item, &site.path_item_path),
            (site.node, &site.path),
        ] {
            for param in self.parameters(owner, owner_path)? {
                params.insert((param.name.clone(), param.location), param);
            }
        }

        let mut path_params = Vec::new();
        let mut query_params = Vec::new();
        let mut header_params = Vec::new();
        let mut cookie_params = Vec::new();
        for param in params.into_values() {
            match param.location {
                ParamLocation::Path => path_params.push(param),
                ParamLocation::Query => query_params.push(param),
                ParamLocation::Header => header_params.push(param),
                ParamLocation::Cookie => cookie_params.push(param),
            }
        }
        let order = path_placeholders(&site.path_template);
        path_params.sort_by_key(|p| {
            order
                .iter()
                .position(|name| *name == p.name)
                .unwrap_or(usize::MAX)
        });

        // 2. Request bodies
        let mut bodies = Vec::new();
        if let Some(body) = site.node.get("requestBody") {
            let located = doc.locate(body, &site.path.join("requestBody"))?;
            let required = located
                .node
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            for content in self.contents(located.node, &located.path)? {
                bodies.push(RequestBodyDescriptor { required, content });
            }
        }

        // 3. Responses
        let mut responses = Vec::new();
        if let Some(declared) = site.node.get("responses").and_then(Value::as_object) {
            let base = site.path.join("responses");
            for (status, response) in declared {
                if status.starts_with("x-") {
                    continue;
                }
                let located = doc.locate(response, &base.join(status.as_str()))?;
                responses.push(ResponseDescriptor {
                    status_code: status.clone(),
                    description: string_field(located.node, "description"),
                    contents: self.contents(located.node, &located.path)?,
                });
            }
        }

        let mut op = OperationDescriptor {
            operation_id: site.operation_id.clone(),
            mangled_id,
            method: site.method.clone(),
            path_template: site.path_template.clone(),
            kind: site.kind.clone(),
            path: site.path.clone(),
            path_params,
            query_params,
            header_params,
            cookie_params,
            bodies,
            responses,
            tags: site
                .node
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            summary: string_field(site.node, "summary"),
            deprecated: bool_field(site.node, "deprecated"),
            simple: false,
        };
        op.simple = is_simple_operation(&op);
        if !op.simple {
            tracing::trace!(operation = %op.operation_id, "not a simple operation");
        }
        Ok(op)
    }

    fn parameters(
        &mut self,
        owner: &Value,
        owner_path: &SchemaPath,
    ) -> AppResult<Vec<ParameterDescriptor>> {
        let Some(declared) = owner.get("parameters").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };
        let doc = self.doc;
        let base = owner_path.join("parameters");
        let mut out = Vec::with_capacity(declared.len());

        for (i, param) in declared.iter().enumerate() {
            let located = doc.locate(param, &base.join(i.to_string()))?;
            let node = located.node;
            let (Some(name), Some(location)) = (
                node.get("name").and_then(Value::as_str),
                node.get("in")
                    .and_then(Value::as_str)
                    .and_then(ParamLocation::parse),
            ) else {
                tracing::debug!(path = %located.path, "skipping parameter without name/in");
                continue;
            };

            let (schema, content_type) = match node.get("schema") {
                Some(schema) => (self.bind(schema, &located.path.join("schema"))?, None),
                None => match node
                    .get("content")
                    .and_then(Value::as_object)
                    .and_then(|c| c.iter().next())
                {
                    Some((ct, media)) => {
                        let schema = match media.get("schema") {
                            Some(schema) => self.bind(
                                schema,
                                &located
                                    .path
                                    .join("content")
                                    .join(ct.as_str())
                                    .join("schema"),
                            )?,
                            None => None,
                        };
                        (schema, Some(ct.clone()))
                    }
                    None => (None, None),
                },
            };

            let style = resolve_style(node.get("style").and_then(Value::as_str), location);
            let explode = resolve_explode(node.get("explode").and_then(Value::as_bool), &style);
            self.ctx.need_param(&style, explode);

            out.push(ParameterDescriptor {
                name: name.to_string(),
                ident: self.mangling.field_name(name),
                location,
                required: location == ParamLocation::Path || bool_field(node, "required"),
                style,
                explode,
                schema,
                content_type,
                description: string_field(node, "description"),
                deprecated: bool_field(node, "deprecated"),
            });
        }
        Ok(out)
    }

    fn contents(
        &mut self,
        owner: &Value,
        owner_path: &SchemaPath,
    ) -> AppResult<Vec<ContentDescriptor>> {
        let Some(content) = owner.get("content").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        let base = owner_path.join("content");
        let mut out = Vec::with_capacity(content.len());

        for (content_type, media) in content {
            let media_path = base.join(content_type.as_str());
            let is_json = self.matcher.is_json(content_type);
            let is_form = self.matcher.is_form(content_type);
            let is_sequential = self.matcher.is_sequential(content_type);

            let schema = match media.get("schema") {
                Some(schema) => self.bind(schema, &media_path.join("schema"))?,
                None => None,
            };
            let item_schema = match media.get("itemSchema").filter(|_| is_sequential) {
                Some(item) => self
                    .bind(item, &media_path.join("itemSchema"))?
                    .map(|schema| ItemSchemaBinding { schema }),
                None => None,
            };
            let typed = schema.is_some() && (is_json || is_form) && !is_sequential;

            if typed && is_form {
                self.ctx.need_helper(HELPER_MARSHAL_FORM);
            }
            if item_schema.is_some() {
                self.ctx.need_helper(HELPER_STREAM_ITEMS);
            }

            out.push(ContentDescriptor {
                content_type: content_type.clone(),
                short_name: self.matcher.short_name(content_type, self.mangling),
                is_json,
                is_form,
                is_sequential,
                typed,
                schema,
                item_schema,
            });
        }
        Ok(out)
    }

    /// Descriptor path for a schema position, following references.
    fn bind(&self, node: &Value, at: &SchemaPath) -> AppResult<Option<SchemaPath>> {
        let located = self.doc.locate(node, at)?;
        Ok(self
            .graph
            .contains(&located.path)
            .then_some(located.path))
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}
