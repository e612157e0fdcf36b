#![deny(missing_docs)]

//! # Codegen Context
//!
//! Per-run accumulator of the features the resolved document needs downstream:
//! imports, runtime helpers, parameter style/bind functions and custom types.
//! Registration is idempotent and every query returns a sorted list, so output does
//! not depend on the order in which the resolver happened to register things.

use serde::Serialize;
use std::collections::BTreeSet;

/// Form-encoding helper for typed form bodies.
pub const HELPER_MARSHAL_FORM: &str = "marshal_form";
/// JSON (de)serialization helper for union wrappers.
pub const HELPER_UNION_JSON: &str = "union_json";
/// Item decoder for sequential media types.
pub const HELPER_STREAM_ITEMS: &str = "stream_items";
/// The nullable wrapper type.
pub const CUSTOM_TYPE_NULLABLE: &str = "nullable";

/// Feature registry for one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodegenContext {
    imports: BTreeSet<String>,
    helpers: BTreeSet<String>,
    params: BTreeSet<String>,
    custom_types: BTreeSet<String>,
}

impl CodegenContext {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an import. Returns `true` the first time.
    pub fn add_import(&mut self, import: impl Into<String>) -> bool {
        self.imports.insert(import.into())
    }

    /// Registers a runtime helper. Returns `true` the first time.
    pub fn need_helper(&mut self, helper: impl Into<String>) -> bool {
        self.helpers.insert(helper.into())
    }

    /// Registers the style and bind functions for a parameter style.
    pub fn need_param(&mut self, style: &str, explode: bool) {
        let suffix = if explode { "_explode" } else { "" };
        self.params.insert(format!("style_{}{}", style, suffix));
        self.params.insert(format!("bind_{}{}", style, suffix));
    }

    /// Registers a custom type. Returns `true` the first time.
    pub fn need_custom_type(&mut self, name: impl Into<String>) -> bool {
        self.custom_types.insert(name.into())
    }

    /// Sorted imports.
    pub fn imports(&self) -> Vec<&str> {
        self.imports.iter().map(String::as_str).collect()
    }

    /// Sorted helpers.
    pub fn helpers(&self) -> Vec<&str> {
        self.helpers.iter().map(String::as_str).collect()
    }

    /// Sorted parameter style/bind keys.
    pub fn param_keys(&self) -> Vec<&str> {
        self.params.iter().map(String::as_str).collect()
    }

    /// Sorted custom types.
    pub fn custom_types(&self) -> Vec<&str> {
        self.custom_types.iter().map(String::as_str).collect()
    }

    /// Whether a helper was registered.
    pub fn has_helper(&self, helper: &str) -> bool {
        self.helpers.contains(helper)
    }

    /// Whether a custom type was registered.
    pub fn has_custom_type(&self, name: &str) -> bool {
        self.custom_types.contains(name)
    }
}
