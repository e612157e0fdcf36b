#![deny(missing_docs)]

//! # Type Mapping
//!
//! Maps OpenAPI primitive `type` + `format` pairs to target-language types.
//!
//! The table is configuration: every primitive has a default target and a set of
//! per-format overrides. User tables are merged over [`TypeMapping::default`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A target-language type, plus the import it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Type expression as emitted.
    #[serde(rename = "type")]
    pub ty: String,
    /// Import/crate the type comes from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
}

impl TypeSpec {
    /// A type that needs no import.
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            import: None,
        }
    }

    /// A type that needs `import`.
    pub fn with_import(ty: impl Into<String>, import: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            import: Some(import.into()),
        }
    }
}

/// Mapping for one primitive `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatMapping {
    /// Target used when no format matches.
    pub default: Option<TypeSpec>,
    /// Target per `format` value.
    pub formats: IndexMap<String, TypeSpec>,
}

impl FormatMapping {
    fn merge(&self, user: &FormatMapping) -> FormatMapping {
        let mut formats = self.formats.clone();
        for (format, spec) in &user.formats {
            formats.insert(format.clone(), spec.clone());
        }
        FormatMapping {
            default: user.default.clone().or_else(|| self.default.clone()),
            formats,
        }
    }

    fn lookup(&self, format: Option<&str>) -> Option<&TypeSpec> {
        format
            .and_then(|f| self.formats.get(f))
            .or(self.default.as_ref())
    }
}

/// Full primitive mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMapping {
    /// `type: integer`.
    pub integer: FormatMapping,
    /// `type: number`.
    pub number: FormatMapping,
    /// `type: boolean`.
    pub boolean: FormatMapping,
    /// `type: string`.
    pub string: FormatMapping,
}

/// Converts a primitive schema type into a target type.
pub trait TypeMapper {
    /// Returns `None` for types the mapper does not know.
    fn map(&self, schema_type: &str, format: Option<&str>) -> Option<TypeSpec>;
}

fn table(default: TypeSpec, formats: &[(&str, TypeSpec)]) -> FormatMapping {
    FormatMapping {
        default: Some(default),
        formats: formats
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    }
}

impl Default for TypeMapping {
    fn default() -> Self {
        Self {
            integer: table(
                TypeSpec::new("i32"),
                &[
                    ("int32", TypeSpec::new("i32")),
                    ("int64", TypeSpec::new("i64")),
                    ("int8", TypeSpec::new("i8")),
                    ("int16", TypeSpec::new("i16")),
                    ("uint32", TypeSpec::new("u32")),
                    ("uint64", TypeSpec::new("u64")),
                ],
            ),
            number: table(
                TypeSpec::new("f64"),
                &[
                    ("float", TypeSpec::new("f32")),
                    ("double", TypeSpec::new("f64")),
                ],
            ),
            boolean: table(TypeSpec::new("bool"), &[]),
            string: table(
                TypeSpec::new("String"),
                &[
                    ("uuid", TypeSpec::with_import("uuid::Uuid", "uuid")),
                    (
                        "date-time",
                        TypeSpec::with_import("chrono::DateTime<chrono::Utc>", "chrono"),
                    ),
                    ("date", TypeSpec::with_import("chrono::NaiveDate", "chrono")),
                    ("binary", TypeSpec::new("Vec<u8>")),
                    ("byte", TypeSpec::new("Vec<u8>")),
                    ("email", TypeSpec::new("String")),
                    ("password", TypeSpec::new("String")),
                ],
            ),
        }
    }
}

impl TypeMapping {
    /// Overlays `user` on `self`: user defaults replace, user formats replace or append.
    pub fn merge(&self, user: &TypeMapping) -> TypeMapping {
        TypeMapping {
            integer: self.integer.merge(&user.integer),
            number: self.number.merge(&user.number),
            boolean: self.boolean.merge(&user.boolean),
            string: self.string.merge(&user.string),
        }
    }
}

impl TypeMapper for TypeMapping {
    fn map(&self, schema_type: &str, format: Option<&str>) -> Option<TypeSpec> {
        let table = match schema_type {
            "integer" => &self.integer,
            "number" => &self.number,
            "boolean" => &self.boolean,
            "string" => &self.string,
            _ => return None,
        };
        table.lookup(format).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_mapping() {
        let m = TypeMapping::default();
        assert_eq!(m.map("integer", None).unwrap().ty, "i32");
        assert_eq!(m.map("integer", Some("int64")).unwrap().ty, "i64");
        assert_eq!(m.map("number", Some("float")).unwrap().ty, "f32");
        assert_eq!(m.map("string", Some("unknown-format")).unwrap().ty, "String");
        assert_eq!(
            m.map("string", Some("uuid")),
            Some(TypeSpec::with_import("uuid::Uuid", "uuid"))
        );
        assert!(m.map("object", None).is_none());
    }

    #[test]
    fn test_merge_overrides_and_appends() {
        let user: TypeMapping = serde_yaml::from_str(
            r#"
integer:
  default:
    type: i64
string:
  formats:
    uuid:
      type: String
    ipv4:
      type: std::net::Ipv4Addr
"#,
        )
        .unwrap();
        let merged = TypeMapping::default().merge(&user);
        assert_eq!(merged.map("integer", None).unwrap().ty, "i64");
        assert_eq!(merged.map("integer", Some("int32")).unwrap().ty, "i32");
        assert_eq!(merged.map("string", Some("uuid")), Some(TypeSpec::new("String")));
        assert_eq!(
            merged.map("string", Some("ipv4")).unwrap().ty,
            "std::net::Ipv4Addr"
        );
        assert_eq!(merged.map("boolean", None).unwrap().ty, "bool");
    }
}
