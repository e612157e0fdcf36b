#![deny(missing_docs)]

//! # Content Types
//!
//! Classifies media type keys: which ones get schema descriptors, which are JSON or
//! form encoded, which are sequential (streamed item by item), and the short token a
//! media type contributes to derived names.

use crate::error::{AppError, AppResult};
use crate::mangle::NameMangling;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Media type that maps to a fixed naming token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortNameRule {
    /// Regular expression matched against the normalized media type.
    pub pattern: String,
    /// Token used in derived names.
    pub name: String,
}

impl ShortNameRule {
    fn new(pattern: &str, name: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            name: name.to_string(),
        }
    }
}

/// Content-type configuration. Every list holds regular expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentTypes {
    /// Media types whose schemas are gathered into the graph.
    pub gather: Vec<String>,
    /// JSON media types.
    pub json: Vec<String>,
    /// Form-encoded media types.
    pub form: Vec<String>,
    /// Sequential media types; these are always gathered.
    pub sequential: Vec<String>,
    /// Ordered naming tokens; first match wins.
    pub short_names: Vec<ShortNameRule>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self {
            gather: strings(&[
                r"^application/json$",
                r"^application/[^/]+\+json$",
                r"^application/x-www-form-urlencoded$",
                r"^multipart/form-data$",
                r"^text/plain$",
            ]),
            json: strings(&[r"^application/json$", r"^application/[^/]+\+json$"]),
            form: strings(&[r"^application/x-www-form-urlencoded$"]),
            sequential: strings(&[
                r"^text/event-stream$",
                r"^application/jsonl$",
                r"^application/x-ndjson$",
                r"^application/json-seq$",
                r"^multipart/mixed$",
            ]),
            short_names: vec![
                ShortNameRule::new(r"^application/json$", "JSON"),
                ShortNameRule::new(r"\+json$", "JSON"),
                ShortNameRule::new(r"^application/x-www-form-urlencoded$", "Form"),
                ShortNameRule::new(r"^multipart/form-data$", "Multipart"),
                ShortNameRule::new(r"^text/plain$", "Text"),
            ],
        }
    }
}

/// Compiled form of [`ContentTypes`].
#[derive(Debug, Clone)]
pub struct ContentTypeMatcher {
    gather: Vec<Regex>,
    json: Vec<Regex>,
    form: Vec<Regex>,
    sequential: Vec<Regex>,
    short_names: Vec<(Regex, String)>,
}

fn compile_one(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        AppError::General(format!("Invalid content type pattern '{}': {}", pattern, e))
    })
}

fn compile(patterns: &[String]) -> AppResult<Vec<Regex>> {
    patterns.iter().map(|p| compile_one(p)).collect()
}

/// Lower-cases and strips media type parameters (`; charset=utf-8`).
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl ContentTypeMatcher {
    /// Compiles the configuration; invalid patterns are an error.
    pub fn new(config: &ContentTypes) -> AppResult<Self> {
        let short_names = config
            .short_names
            .iter()
            .map(|rule| Ok((compile_one(&rule.pattern)?, rule.name.clone())))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self {
            gather: compile(&config.gather)?,
            json: compile(&config.json)?,
            form: compile(&config.form)?,
            sequential: compile(&config.sequential)?,
            short_names,
        })
    }

    fn matches(set: &[Regex], content_type: &str) -> bool {
        let normalized = normalize_media_type(content_type);
        set.iter().any(|re| re.is_match(&normalized))
    }

    /// Whether schemas under this media type become descriptors.
    pub fn is_gathered(&self, content_type: &str) -> bool {
        Self::matches(&self.gather, content_type) || self.is_sequential(content_type)
    }

    /// JSON, excluding sequential JSON framings.
    pub fn is_json(&self, content_type: &str) -> bool {
        Self::matches(&self.json, content_type) && !self.is_sequential(content_type)
    }

    /// Form encoded.
    pub fn is_form(&self, content_type: &str) -> bool {
        Self::matches(&self.form, content_type)
    }

    /// Streamed as a sequence of items.
    pub fn is_sequential(&self, content_type: &str) -> bool {
        Self::matches(&self.sequential, content_type)
    }

    /// Naming token, falling back to the mangled media type.
    pub fn short_name(&self, content_type: &str, mangling: &NameMangling) -> String {
        let normalized = normalize_media_type(content_type);
        self.short_names
            .iter()
            .find(|(re, _)| re.is_match(&normalized))
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| mangling.type_name(&normalized))
    }
}
