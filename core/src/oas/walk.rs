#![deny(missing_docs)]

//! # Operation Walk
//!
//! Flattens `paths`, `webhooks` and nested `callbacks` into one ordered list of
//! operation sites. Both the schema graph builder and the operation builder consume
//! this list, so they agree on visitation order and on derived operation ids.
//!
//! Order: paths in declaration order, method keys in the order they appear in each
//! path item (then `additionalOperations`), each operation immediately followed by
//! its callbacks; webhooks last.

use crate::error::{AppError, AppResult};
use crate::oas::document::OpenApiDocument;
use crate::oas::pointer::SchemaPath;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Fixed HTTP method keys of a Path Item Object.
pub const HTTP_METHODS: [&str; 9] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace", "query",
];

/// Where an operation was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationKind {
    /// A standard HTTP endpoint defined in `paths`.
    Path,
    /// An event receiver defined in `webhooks`.
    Webhook,
    /// An outgoing request declared under an operation's `callbacks`.
    Callback {
        /// Operation id of the declaring operation.
        parent: String,
        /// Callback key.
        name: String,
        /// Runtime expression the callback URL is computed from.
        expression: String,
    },
}

/// One operation, located in the document.
#[derive(Debug, Clone)]
pub struct OperationSite<'a> {
    /// Declaration kind.
    pub kind: OperationKind,
    /// Upper-case HTTP method.
    pub method: String,
    /// Path template, webhook name, or callback expression.
    pub path_template: String,
    /// Declared `operationId`, or one derived from method and path.
    pub operation_id: String,
    /// Whether `operation_id` was declared in the document.
    pub declared_id: bool,
    /// The Operation Object.
    pub node: &'a Value,
    /// Structural path of the Operation Object.
    pub path: SchemaPath,
    /// The (dereferenced) Path Item Object the operation belongs to.
    pub path_item: &'a Value,
    /// Structural path of that Path Item Object.
    pub path_item_path: SchemaPath,
}

/// Derives an operation id from the HTTP Method and URL path when `operationId` is missing.
///
/// e.g. `GET /users/{id}` -> `get_users_id`
pub fn derive_operation_id(method: &str, path: &str) -> String {
    let clean_path = path.replace(['{', '}'], "").replace(['/', '.', '-'], "_");
    let clean_path = clean_path.trim_matches('_');
    if clean_path.is_empty() {
        format!("{}_root", method.to_lowercase())
    } else {
        format!("{}_{}", method.to_lowercase(), clean_path)
    }
}

/// Collects every operation site in walk order.
///
/// Fails on dangling path item / callback references and on duplicate declared
/// `operationId`s.
pub fn collect_operations(doc: &OpenApiDocument) -> AppResult<Vec<OperationSite<'_>>> {
    let mut walker = Walker {
        doc,
        sites: Vec::new(),
        declared: HashMap::new(),
    };

    let root = SchemaPath::root();
    for (section, kind) in [("paths", OperationKind::Path), ("webhooks", OperationKind::Webhook)] {
        let Some(items) = doc.root().get(section).and_then(Value::as_object) else {
            continue;
        };
        let section_path = root.join(section);
        for (template, item) in items {
            if template.starts_with("x-") {
                continue;
            }
            walker.path_item(template, item, section_path.join(template.as_str()), &kind)?;
        }
    }

    Ok(walker.sites)
}

struct Walker<'a> {
    doc: &'a OpenApiDocument,
    sites: Vec<OperationSite<'a>>,
    declared: HashMap<String, SchemaPath>,
}

impl<'a> Walker<'a> {
    fn path_item(
        &mut self,
        template: &str,
        item: &'a Value,
        at: SchemaPath,
        kind: &OperationKind,
    ) -> AppResult<()> {
        let located = self.doc.locate(item, &at)?;
        let Some(map) = located.node.as_object() else {
            return Ok(());
        };

        for (key, op) in map {
            if HTTP_METHODS.contains(&key.as_str()) {
                let op_path = located.path.join(key.as_str());
                self.operation(template, key, op, op_path, located.node, &located.path, kind)?;
            }
        }

        if let Some(extra) = map.get("additionalOperations").and_then(Value::as_object) {
            let extra_path = located.path.join("additionalOperations");
            for (method, op) in extra {
                if HTTP_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                    continue;
                }
                let op_path = extra_path.join(method.as_str());
                self.operation(template, method, op, op_path, located.node, &located.path, kind)?;
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn operation(
        &mut self,
        template: &str,
        method: &str,
        op: &'a Value,
        op_path: SchemaPath,
        path_item: &'a Value,
        path_item_path: &SchemaPath,
        kind: &OperationKind,
    ) -> AppResult<()> {
        if !op.is_object() {
            return Ok(());
        }

        // 1. Operation Id
        let declared = op.get("operationId").and_then(Value::as_str);
        let operation_id = match (declared, kind) {
            (Some(id), _) => {
                if let Some(first) = self.declared.get(id) {
                    return Err(AppError::DuplicateOperationId {
                        operation_id: id.to_string(),
                        first: first.clone(),
                        second: op_path,
                    });
                }
                self.declared.insert(id.to_string(), op_path.clone());
                id.to_string()
            }
            (None, OperationKind::Callback { parent, name, .. }) => {
                format!("{}_{}_{}", parent, name, method.to_lowercase())
            }
            (None, OperationKind::Webhook) => {
                format!("{}_{}_webhook", method.to_lowercase(), template)
            }
            (None, OperationKind::Path) => derive_operation_id(method, template),
        };

        self.sites.push(OperationSite {
            kind: kind.clone(),
            method: method.to_ascii_uppercase(),
            path_template: template.to_string(),
            operation_id: operation_id.clone(),
            declared_id: declared.is_some(),
            node: op,
            path: op_path.clone(),
            path_item,
            path_item_path: path_item_path.clone(),
        });

        // 2. Callbacks, depth first so they follow their parent.
        let Some(callbacks) = op.get("callbacks").and_then(Value::as_object) else {
            return Ok(());
        };
        let callbacks_path = op_path.join("callbacks");
        for (name, callback) in callbacks {
            let at = callbacks_path.join(name.as_str());
            let located = self.doc.locate(callback, &at)?;
            let Some(expressions) = located.node.as_object() else {
                continue;
            };
            for (expression, item) in expressions {
                if expression.starts_with("x-") {
                    continue;
                }
                let cb_kind = OperationKind::Callback {
                    parent: operation_id.clone(),
                    name: name.clone(),
                    expression: expression.clone(),
                };
                self.path_item(expression, item, located.path.join(expression.as_str()), &cb_kind)?;
            }
        }

        Ok(())
    }
}
