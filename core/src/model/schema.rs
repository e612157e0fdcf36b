#![deny(missing_docs)]

//! # Schema Descriptors
//!
//! One `SchemaDescriptor` exists per distinct schema occurrence in the document.
//! Its identity is its [`SchemaPath`]; shapes and names refer to other descriptors
//! by path only.

use crate::error::{AppError, AppResult};
use crate::oas::pointer::SchemaPath;
use crate::type_mapping::TypeSpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Extension carrying a verbatim type-name override.
pub const EXT_TYPE_NAME: &str = "x-codegen-type-name";
/// Extension carrying a full target-type override.
pub const EXT_TYPE_OVERRIDE: &str = "x-codegen-type";
/// Extension asking for optional fields of this type to be held by value.
pub const EXT_SKIP_OPTIONAL_POINTER: &str = "x-codegen-skip-optional-pointer";
/// Extension forcing omit-empty behaviour on or off.
pub const EXT_OMIT_EMPTY: &str = "x-codegen-omitempty";

/// Naming section of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Declared under `components/schemas`.
    ComponentSchema,
    /// Bound to a parameter.
    Parameter,
    /// Bound to request body content.
    RequestBody,
    /// Bound to response content.
    Response,
    /// Nested inside another schema.
    Inline,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::ComponentSchema => "component_schema",
            Section::Parameter => "parameter",
            Section::RequestBody => "request_body",
            Section::Response => "response",
            Section::Inline => "inline",
        };
        f.write_str(name)
    }
}

/// Parameter location (`in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    /// Path template variable.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParamLocation {
    /// Parses the `in` keyword.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    /// Capitalized token used in derived names.
    pub fn token(self) -> &'static str {
        match self {
            Self::Path => "Path",
            Self::Query => "Query",
            Self::Header => "Header",
            Self::Cookie => "Cookie",
        }
    }
}

/// Who declared a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamOwner {
    /// An operation, by walk index.
    Operation {
        /// Index into the operation walk.
        index: usize,
        /// Raw operation id.
        operation_id: String,
    },
    /// A path item (shared by all its operations).
    PathItem {
        /// Path template of the item.
        template: String,
    },
}

/// Relationship of a nested descriptor to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NestedRole {
    /// Value of a named property.
    Property(String),
    /// Array element.
    Items,
    /// Value of `additionalProperties`.
    AdditionalProperties,
    /// Zero-based `oneOf` branch.
    OneOf(usize),
    /// Zero-based `anyOf` branch.
    AnyOf(usize),
    /// Zero-based `allOf` branch.
    AllOf(usize),
}

/// Naming context recorded when a descriptor is first visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    /// A `components/schemas` entry.
    Component {
        /// Component key.
        name: String,
    },
    /// A parameter schema.
    Parameter {
        /// Declaring operation or path item.
        owner: ParamOwner,
        /// Parameter name.
        name: String,
        /// Parameter location.
        location: ParamLocation,
    },
    /// Request body content (or its item schema).
    RequestBody {
        /// Index into the operation walk.
        operation: usize,
        /// Raw operation id.
        operation_id: String,
        /// Media type key.
        content_type: String,
        /// True for an `itemSchema` binding.
        item: bool,
    },
    /// Response content (or its item schema).
    Response {
        /// Index into the operation walk.
        operation: usize,
        /// Raw operation id.
        operation_id: String,
        /// Status code key (`200`, `4XX`, `default`).
        status: String,
        /// Media type key.
        content_type: String,
        /// True for an `itemSchema` binding.
        item: bool,
    },
    /// Nested inside another descriptor.
    Nested {
        /// Parent descriptor path.
        parent: SchemaPath,
        /// Relationship to the parent.
        role: NestedRole,
    },
}

/// Operator-supplied directives read from schema extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
    /// Verbatim type name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Full target type; the shape becomes an alias to it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_override: Option<TypeSpec>,
    /// Optional uses of this schema are held by value.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_optional_pointer: bool,
    /// Forced omit-empty behaviour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit_empty: Option<bool>,
}

impl Overrides {
    /// Reads directives from a schema node; malformed values are skipped.
    pub fn from_schema(node: &Value, path: &SchemaPath) -> Self {
        let mut out = Overrides::default();

        match node.get(EXT_TYPE_NAME) {
            None => {}
            Some(Value::String(name)) if is_identifier(name) => out.type_name = Some(name.clone()),
            Some(other) => {
                tracing::debug!(%path, value = %other, "ignoring invalid {}", EXT_TYPE_NAME);
            }
        }

        match node.get(EXT_TYPE_OVERRIDE) {
            None => {}
            Some(Value::String(ty)) if !ty.trim().is_empty() => {
                out.type_override = Some(TypeSpec::new(ty.trim()));
            }
            Some(value @ Value::Object(_)) => {
                match serde_json::from_value::<TypeSpec>(value.clone()) {
                    Ok(spec) if !spec.ty.trim().is_empty() => out.type_override = Some(spec),
                    _ => tracing::debug!(%path, "ignoring invalid {}", EXT_TYPE_OVERRIDE),
                }
            }
            Some(_) => tracing::debug!(%path, "ignoring invalid {}", EXT_TYPE_OVERRIDE),
        }

        out.skip_optional_pointer = node
            .get(EXT_SKIP_OPTIONAL_POINTER)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        out.omit_empty = node.get(EXT_OMIT_EMPTY).and_then(Value::as_bool);
        out
    }

    /// Folds another member's directives into these (used by `allOf` merges).
    ///
    /// Flags accumulate; explicit values from `other` win.
    pub fn absorb(&mut self, other: &Overrides) {
        self.skip_optional_pointer |= other.skip_optional_pointer;
        if other.omit_empty.is_some() {
            self.omit_empty = other.omit_empty;
        }
        if self.type_override.is_none() {
            self.type_override = other.type_override.clone();
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A resolved reference to a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// Another descriptor, by path.
    Schema {
        /// Target descriptor path.
        path: SchemaPath,
    },
    /// A target-language type from the mapping table or an override.
    Primitive(TypeSpec),
    /// Unconstrained value.
    Any,
}

impl TypeRef {
    /// Reference to a descriptor.
    pub fn schema(path: SchemaPath) -> Self {
        TypeRef::Schema { path }
    }

    /// Target path when this references a descriptor.
    pub fn as_schema(&self) -> Option<&SchemaPath> {
        match self {
            TypeRef::Schema { path } => Some(path),
            _ => None,
        }
    }
}

/// One property of a struct shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Wire name.
    pub name: String,
    /// Mangled identifier.
    pub ident: String,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Not listed in `required`.
    pub optional: bool,
    /// Optional form wraps the value (pointer / `Option`).
    pub pointer: bool,
    /// Omitted from output when empty.
    pub omit_empty: bool,
    /// Directives on the property schema (after `allOf` propagation).
    #[serde(skip_serializing_if = "is_default_overrides")]
    pub overrides: Overrides,
    /// Rendered annotation tags, by tag name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub tags: IndexMap<String, String>,
    /// Property description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked `deprecated`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

fn is_default_overrides(o: &Overrides) -> bool {
    *o == Overrides::default()
}

/// `oneOf` or `anyOf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionKind {
    /// Exactly one member matches.
    OneOf,
    /// One or more members match.
    AnyOf,
}

/// Discriminator of a union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    /// Property carrying the tag.
    pub property_name: String,
    /// Tag value to member schema.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, SchemaPath>,
}

/// Struct shape body.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StructShape {
    /// Fields in declaration (merge) order.
    pub fields: Vec<Field>,
    /// Value type of `additionalProperties`, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<TypeRef>,
}

/// Union shape body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionShape {
    /// Composition keyword.
    #[serde(rename = "composition")]
    pub kind: UnionKind,
    /// Deduplicated members in declaration order.
    pub members: Vec<TypeRef>,
    /// Discriminator, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
}

/// Generated shape of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Record with named fields.
    Struct(StructShape),
    /// Another name for an existing type.
    Alias {
        /// Aliased type.
        target: TypeRef,
    },
    /// Homogeneous sequence.
    Array {
        /// Element type.
        element: TypeRef,
    },
    /// Tagged/untagged union of members.
    UnionWrapper(UnionShape),
    /// A value that may be explicitly null.
    NullableWrapper {
        /// Wrapped type; never itself nullable.
        inner: TypeRef,
    },
}

/// One schema occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescriptor {
    /// Structural identity.
    pub path: SchemaPath,
    /// Section the occurrence belongs to.
    pub section: Section,
    /// Section whose names this descriptor competes with.
    pub scope: Section,
    /// Component key, for named components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_name: Option<String>,
    /// Naming context.
    pub origin: Origin,
    /// Nesting depth below the root occurrence.
    pub depth: usize,
    /// Operator directives.
    #[serde(skip_serializing_if = "is_default_overrides")]
    pub overrides: Overrides,
    /// Schema description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marked `deprecated`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// `enum` values, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Object schema whose type list also admits `null`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    shape: Option<Shape>,
    final_name: Option<String>,
}

impl SchemaDescriptor {
    /// Creates an unresolved descriptor.
    pub fn new(path: SchemaPath, section: Section, scope: Section, origin: Origin) -> Self {
        let raw_name = match &origin {
            Origin::Component { name } => Some(name.clone()),
            _ => None,
        };
        Self {
            path,
            section,
            scope,
            raw_name,
            origin,
            depth: 0,
            overrides: Overrides::default(),
            description: None,
            deprecated: false,
            enum_values: Vec::new(),
            nullable: false,
            shape: None,
            final_name: None,
        }
    }

    /// Classified shape; `None` until the composition phase ran.
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Final identifier; `None` until the naming phase ran.
    pub fn final_name(&self) -> Option<&str> {
        self.final_name.as_deref()
    }

    pub(crate) fn set_shape(&mut self, shape: Shape) -> AppResult<()> {
        if self.shape.is_some() {
            return Err(AppError::General(format!(
                "shape of {} assigned twice",
                self.path
            )));
        }
        self.shape = Some(shape);
        Ok(())
    }

    pub(crate) fn set_final_name(&mut self, name: String) -> AppResult<()> {
        if self.final_name.is_some() {
            return Err(AppError::General(format!(
                "name of {} assigned twice",
                self.path
            )));
        }
        self.final_name = Some(name);
        Ok(())
    }
}
