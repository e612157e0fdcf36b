#![deny(missing_docs)]

//! # OpenAPI Document
//!
//! The loaded, normalized document tree plus local `$ref` dereferencing.
//!
//! The tree is kept as an order-preserving `serde_json::Value` so that every walk
//! observes declaration order, which later phases rely on for tie-breaks.

use crate::error::{AppError, AppResult};
use crate::oas::normalization::normalize_document;
use crate::oas::pointer::SchemaPath;
use crate::oas::ref_utils::local_target;
use serde_json::Value;
use std::collections::HashSet;

/// A parsed OpenAPI 3.x document.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    root: Value,
    version: String,
    self_uri: Option<String>,
}

/// A dereferenced node together with the structural path of its declaration.
#[derive(Debug, Clone)]
pub struct Located<'a> {
    /// The target node.
    pub node: &'a Value,
    /// Where the target is declared.
    pub path: SchemaPath,
    /// Whether at least one reference was followed.
    pub via_ref: bool,
}

/// Returns the `$ref` string of a reference object.
pub fn ref_target(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

impl OpenApiDocument {
    /// Parses YAML (or JSON, which is valid YAML) source.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| AppError::Document(format!("Failed to parse OpenAPI YAML: {}", e)))?;
        Self::from_value(value)
    }

    /// Wraps an already-parsed tree, validating the version and normalizing it.
    pub fn from_value(mut root: Value) -> AppResult<Self> {
        if !root.is_object() {
            return Err(AppError::Document(
                "OpenAPI document root must be a mapping".into(),
            ));
        }
        if root.get("swagger").is_some() {
            return Err(AppError::Document(
                "Swagger 2.0 documents are not supported; convert to OpenAPI 3.x".into(),
            ));
        }
        let version = match root.get("openapi") {
            Some(Value::String(v)) => v.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(AppError::Document(
                    "OpenAPI document missing required 'openapi' field".into(),
                ))
            }
        };
        if !version.starts_with("3.") {
            return Err(AppError::Document(format!(
                "Unsupported OpenAPI version '{}'",
                version
            )));
        }

        normalize_document(&mut root);
        let self_uri = root
            .get("$self")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            root,
            version,
            self_uri,
        })
    }

    /// The normalized tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The declared `openapi` version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The document's `$self` URI, if declared.
    pub fn self_uri(&self) -> Option<&str> {
        self.self_uri.as_deref()
    }

    /// Node at a structural path.
    pub fn node(&self, path: &SchemaPath) -> Option<&Value> {
        path.lookup(&self.root)
    }

    /// Follows `node`'s reference chain (if any), tracking the declaring path.
    ///
    /// `at` is the structural path of `node` itself and is what errors report.
    pub fn locate<'a>(&'a self, node: &'a Value, at: &SchemaPath) -> AppResult<Located<'a>> {
        let mut current = node;
        let mut path = at.clone();
        let mut via_ref = false;
        let mut seen = HashSet::new();

        while let Some(reference) = ref_target(current) {
            let dangling = || AppError::DanglingRef {
                path: at.clone(),
                reference: reference.to_string(),
            };
            let target = local_target(reference, self.self_uri()).ok_or_else(dangling)?;
            if !seen.insert(target.clone()) {
                return Err(dangling());
            }
            current = target.lookup(&self.root).ok_or_else(dangling)?;
            path = target;
            via_ref = true;
        }

        Ok(Located {
            node: current,
            path,
            via_ref,
        })
    }
}
