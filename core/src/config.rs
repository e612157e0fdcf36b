#![deny(missing_docs)]

//! # Resolver Configuration
//!
//! Everything the resolver's policies read. Every section defaults, so an empty
//! YAML file is a valid configuration:
//!
//! ```yaml
//! type_mapping:
//!   string:
//!     formats:
//!       uuid: { type: "uuid::Uuid", import: uuid }
//! name_mangling:
//!   substitutions:
//!     petStore: Shop
//! struct_tags:
//!   tags:
//!     - name: db
//!       template: "{{ .FieldIdent }}"
//! content_types:
//!   sequential: ["^text/event-stream$"]
//! ```

use crate::content_types::ContentTypes;
use crate::error::{AppError, AppResult};
use crate::mangle::NameMangling;
use crate::struct_tags::StructTagsConfig;
use crate::type_mapping::TypeMapping;
use serde::{Deserialize, Serialize};

/// Resolver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Primitive type/format mapping (merged over the defaults).
    pub type_mapping: TypeMapping,
    /// Identifier mangling policy.
    pub name_mangling: NameMangling,
    /// Annotation templates (merged over the defaults).
    pub struct_tags: StructTagsConfig,
    /// Media type classification.
    pub content_types: ContentTypes,
}

impl ResolverConfig {
    /// Parses a YAML configuration file body.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| AppError::General(format!("Failed to parse resolver config: {}", e)))
    }

    /// The configuration actually applied: user tables merged over the defaults.
    pub fn effective(&self) -> ResolverConfig {
        ResolverConfig {
            type_mapping: TypeMapping::default().merge(&self.type_mapping),
            name_mangling: self.name_mangling.clone(),
            struct_tags: StructTagsConfig::default().merge(&self.struct_tags),
            content_types: self.content_types.clone(),
        }
    }
}
