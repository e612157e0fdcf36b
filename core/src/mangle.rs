#![deny(missing_docs)]

//! # Name Mangling
//!
//! Turns raw document strings (component keys, operation ids, property names,
//! media types) into identifiers.
//!
//! Type names are UpperCamelCase with configurable initialisms (`JsonPatch` ->
//! `JSONPatch`); all-caps words from the source are kept (`Resource_MVO` ->
//! `ResourceMVO`). Field identifiers are snake_case.

use heck::{ToSnakeCase, ToUpperCamelCase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const DEFAULT_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "URI", "URL", "UTF8", "UUID", "VM", "XML", "XMPP", "XSRF", "XSS",
];

const DEFAULT_RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "Option",
    "Result", "Vec", "String", "Box",
];

/// Configurable mangling policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameMangling {
    /// Words forced to upper case in type names.
    pub initialisms: Vec<String>,
    /// Identifiers that need a suffix.
    pub reserved_words: Vec<String>,
    /// Appended to reserved type names.
    pub reserved_type_suffix: String,
    /// Appended to reserved field identifiers.
    pub reserved_field_suffix: String,
    /// Prepended to identifiers that would start with a digit.
    pub digit_prefix: String,
    /// Raw name to identifier, applied before anything else.
    pub substitutions: IndexMap<String, String>,
}

impl Default for NameMangling {
    fn default() -> Self {
        Self {
            initialisms: DEFAULT_INITIALISMS.iter().map(|s| s.to_string()).collect(),
            reserved_words: DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect(),
            reserved_type_suffix: "Type".to_string(),
            reserved_field_suffix: "_".to_string(),
            digit_prefix: "N".to_string(),
            substitutions: IndexMap::new(),
        }
    }
}

/// Splits a raw string into words on separators and case boundaries.
///
/// `HTTPServer_v2-url` -> `["HTTP", "Server", "v2", "url"]`
pub fn split_words(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in raw.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let prev = chars[i - 1];
            let cur = chars[i];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let boundary = (cur.is_uppercase() && (prev.is_lowercase() || prev.is_numeric()))
                || (cur.is_uppercase() && prev.is_uppercase() && next_is_lower);
            if boundary {
                words.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        if start < chars.len() {
            words.push(chars[start..].iter().collect());
        }
    }
    words
}

impl NameMangling {
    /// Mangles a raw string into a type identifier.
    pub fn type_name(&self, raw: &str) -> String {
        if let Some(substitute) = self.substitutions.get(raw) {
            return substitute.clone();
        }

        let mut out = self.type_part(raw);
        if out.is_empty() {
            out = "Type".to_string();
        }
        if out.starts_with(|c: char| c.is_ascii_digit()) {
            out = format!("{}{}", self.digit_prefix, out);
        }
        if self.is_reserved(&out) {
            out.push_str(&self.reserved_type_suffix);
        }
        out
    }

    /// UpperCamel fragment for composing a larger type name. No prefix or suffix
    /// rules apply; may be empty.
    pub fn type_part(&self, raw: &str) -> String {
        if let Some(substitute) = self.substitutions.get(raw) {
            return substitute.clone();
        }
        split_words(raw).iter().map(|w| self.word(w)).collect()
    }

    /// Mangles a raw property name into a field identifier.
    pub fn field_name(&self, raw: &str) -> String {
        let mut out = raw.to_snake_case();
        if out.is_empty() {
            out = "field".to_string();
        }
        if out.starts_with(|c: char| c.is_ascii_digit()) {
            out = format!("{}_{}", self.digit_prefix.to_lowercase(), out);
        }
        if self.is_reserved(&out) {
            out.push_str(&self.reserved_field_suffix);
        }
        out
    }

    fn word(&self, word: &str) -> String {
        let upper = word.to_uppercase();
        if self.initialisms.iter().any(|i| *i == upper) {
            return upper;
        }
        let has_letters = word.chars().any(char::is_alphabetic);
        if word.chars().count() > 1 && has_letters && !word.chars().any(char::is_lowercase) {
            return word.to_string();
        }
        word.to_lowercase().to_upper_camel_case()
    }

    fn is_reserved(&self, ident: &str) -> bool {
        self.reserved_words.iter().any(|w| w == ident)
    }
}
