#![deny(missing_docs)]

//! # Structural Paths
//!
//! `SchemaPath` is the identity of every node the resolver tracks: an ordered list of
//! unescaped JSON Pointer segments rooted at the document. Names are derived from it,
//! never the other way around.

use crate::oas::ref_utils::decode_pointer_segment;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Structural locator of a node inside an OpenAPI document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaPath(Vec<String>);

impl SchemaPath {
    /// The document root (`#`).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from already-unescaped segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses a local fragment such as `#/components/schemas/Pet`.
    ///
    /// Returns `None` for anything that is not a document-local pointer.
    pub fn from_pointer(fragment: &str) -> Option<Self> {
        let pointer = fragment.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(Self::root());
        }
        let pointer = pointer.strip_prefix('/')?;
        Some(Self(pointer.split('/').map(decode_pointer_segment).collect()))
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.push(segment.into());
        Self(next)
    }

    /// The unescaped segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the document root.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// True when `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &SchemaPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// True for `#/components/schemas/{name}` exactly.
    pub fn is_component_schema(&self) -> bool {
        self.0.len() == 3 && self.0[0] == "components" && self.0[1] == "schemas"
    }

    /// Renders as an RFC 6901 fragment.
    pub fn to_pointer(&self) -> String {
        let mut out = String::from("#");
        for segment in &self.0 {
            out.push('/');
            out.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        }
        out
    }

    /// Looks the path up in a JSON tree.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

impl Serialize for SchemaPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}

impl<'de> Deserialize<'de> for SchemaPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SchemaPath::from_pointer(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("not a local pointer: {raw}")))
    }
}
