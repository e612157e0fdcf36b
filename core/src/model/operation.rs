#![deny(missing_docs)]

//! # Operation Descriptors
//!
//! Call surfaces: one `OperationDescriptor` per HTTP operation, webhook, or callback,
//! with parameters, request bodies and responses bound to schema descriptors by path.

use crate::model::schema::ParamLocation;
use crate::oas::pointer::SchemaPath;
use crate::oas::walk::OperationKind;
use serde::Serialize;

/// A resolved parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    /// Wire name.
    pub name: String,
    /// Mangled identifier.
    pub ident: String,
    /// Location.
    pub location: ParamLocation,
    /// Whether it must be supplied (always true for path parameters).
    pub required: bool,
    /// Serialization style.
    pub style: String,
    /// Explode flag.
    pub explode: bool,
    /// Schema descriptor, when the parameter has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaPath>,
    /// Media type when the parameter uses `content` instead of `schema`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked `deprecated`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// Binding of a sequential media type to its per-item schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSchemaBinding {
    /// Descriptor for one stream item.
    pub schema: SchemaPath,
}

/// One media type of a body or response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDescriptor {
    /// Media type key as declared.
    pub content_type: String,
    /// Naming token (`JSON`, `Form`, ...).
    pub short_name: String,
    /// JSON encoded.
    pub is_json: bool,
    /// Form encoded.
    pub is_form: bool,
    /// Streamed item by item.
    pub is_sequential: bool,
    /// Has a schema and a structured (JSON or form) encoding.
    pub typed: bool,
    /// Schema descriptor (the envelope, for sequential media types).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaPath>,
    /// Per-item schema of a sequential media type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<ItemSchemaBinding>,
}

/// A request body media type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodyDescriptor {
    /// Whether the body is required.
    pub required: bool,
    /// The media type and its schema binding.
    #[serde(flatten)]
    pub content: ContentDescriptor,
}

/// One response status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDescriptor {
    /// Status key: `200`, `4XX`, or `default`.
    pub status_code: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media types in declaration order.
    pub contents: Vec<ContentDescriptor>,
}

impl ResponseDescriptor {
    /// `2xx`, including the `2XX` range key.
    pub fn is_success(&self) -> bool {
        let code = self.status_code.as_bytes();
        code.len() == 3 && code[0] == b'2'
    }

    /// `4xx`/`5xx`, including range keys.
    pub fn is_error(&self) -> bool {
        let code = self.status_code.as_bytes();
        code.len() == 3 && (code[0] == b'4' || code[0] == b'5')
    }

    /// The `default` response.
    pub fn is_default(&self) -> bool {
        self.status_code == "default"
    }
}

/// A fully bound operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    /// Declared or derived operation id.
    pub operation_id: String,
    /// Unique mangled identifier.
    pub mangled_id: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Path template (webhook name / callback expression for those kinds).
    pub path_template: String,
    /// Declaration kind.
    pub kind: OperationKind,
    /// Structural path of the Operation Object.
    pub path: SchemaPath,
    /// Path parameters in template order.
    pub path_params: Vec<ParameterDescriptor>,
    /// Query parameters in declaration order.
    pub query_params: Vec<ParameterDescriptor>,
    /// Header parameters in declaration order.
    pub header_params: Vec<ParameterDescriptor>,
    /// Cookie parameters in declaration order.
    pub cookie_params: Vec<ParameterDescriptor>,
    /// One entry per request media type.
    pub bodies: Vec<RequestBodyDescriptor>,
    /// Responses in declaration order.
    pub responses: Vec<ResponseDescriptor>,
    /// Tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Marked `deprecated`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Eligible for the simplified client surface.
    pub simple: bool,
}

impl OperationDescriptor {
    /// Declares a request body.
    pub fn has_body(&self) -> bool {
        !self.bodies.is_empty()
    }

    /// At least one body is typed.
    pub fn has_typed_body(&self) -> bool {
        self.bodies.iter().any(|b| b.content.typed)
    }

    /// All parameters: path, query, header, cookie.
    pub fn all_params(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.path_params
            .iter()
            .chain(&self.query_params)
            .chain(&self.header_params)
            .chain(&self.cookie_params)
    }

    /// `2xx` responses.
    pub fn success_responses(&self) -> impl Iterator<Item = &ResponseDescriptor> {
        self.responses.iter().filter(|r| r.is_success())
    }

    /// The response whose JSON body describes errors: `default` first, then the
    /// first `4xx`/`5xx` with JSON content.
    pub fn error_response(&self) -> Option<&ResponseDescriptor> {
        let has_json = |r: &&ResponseDescriptor| r.contents.iter().any(|c| c.is_json);
        self.responses
            .iter()
            .filter(|r| r.is_default())
            .find(has_json)
            .or_else(|| {
                self.responses
                    .iter()
                    .filter(|r| r.is_error())
                    .find(has_json)
            })
    }
}

/// Whether an operation qualifies for the simplified surface: exactly one `2xx`
/// response with exactly one media type which is JSON, and a typed body if it
/// has a body at all.
pub fn is_simple_operation(op: &OperationDescriptor) -> bool {
    if op.has_body() && !op.has_typed_body() {
        return false;
    }
    let mut success = op.success_responses();
    match (success.next(), success.next()) {
        (Some(only), None) => only.contents.len() == 1 && only.contents[0].is_json,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(ct: &str, is_json: bool, typed: bool) -> ContentDescriptor {
        ContentDescriptor {
            content_type: ct.into(),
            short_name: "JSON".into(),
            is_json,
            is_form: false,
            is_sequential: false,
            typed,
            schema: None,
            item_schema: None,
        }
    }

    fn response(status: &str, contents: Vec<ContentDescriptor>) -> ResponseDescriptor {
        ResponseDescriptor {
            status_code: status.into(),
            description: None,
            contents,
        }
    }

    fn op(
        bodies: Vec<RequestBodyDescriptor>,
        responses: Vec<ResponseDescriptor>,
    ) -> OperationDescriptor {
        OperationDescriptor {
            operation_id: "op".into(),
            mangled_id: "Op".into(),
            method: "GET".into(),
            path_template: "/".into(),
            kind: OperationKind::Path,
            path: SchemaPath::root(),
            path_params: vec![],
            query_params: vec![],
            header_params: vec![],
            cookie_params: vec![],
            bodies,
            responses,
            tags: vec![],
            summary: None,
            deprecated: false,
            simple: false,
        }
    }

    #[test]
    fn test_simple_requires_single_json_success() {
        let ok = op(vec![], vec![response("200", vec![content("application/json", true, true)])]);
        assert!(is_simple_operation(&ok));

        let two = op(
            vec![],
            vec![
                response("200", vec![content("application/json", true, true)]),
                response("201", vec![content("application/json", true, true)]),
            ],
        );
        assert!(!is_simple_operation(&two));

        let multi_ct = op(
            vec![],
            vec![response(
                "200",
                vec![
                    content("application/json", true, true),
                    content("application/xml", false, false),
                ],
            )],
        );
        assert!(!is_simple_operation(&multi_ct));

        let none = op(vec![], vec![response("204", vec![])]);
        assert!(!is_simple_operation(&none));
    }

    #[test]
    fn test_simple_requires_typed_body() {
        let untyped = RequestBodyDescriptor {
            required: true,
            content: content("application/octet-stream", false, false),
        };
        let o = op(
            vec![untyped],
            vec![response("200", vec![content("application/json", true, true)])],
        );
        assert!(!is_simple_operation(&o));
    }

    #[test]
    fn test_error_response_prefers_default() {
        let o = op(
            vec![],
            vec![
                response("200", vec![content("application/json", true, true)]),
                response("404", vec![content("application/json", true, true)]),
                response("default", vec![content("application/json", true, true)]),
            ],
        );
        assert_eq!(o.error_response().map(|r| r.status_code.as_str()), Some("default"));
        let o = op(vec![], vec![response("5XX", vec![content("application/json", true, true)])]);
        assert_eq!(o.error_response().map(|r| r.status_code.as_str()), Some("5XX"));
    }
}
