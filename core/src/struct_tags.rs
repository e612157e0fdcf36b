#![deny(missing_docs)]

//! # Struct Tags
//!
//! Per-field annotation templates (serialization tags). A template is a small text
//! language:
//!
//! - `{{ .FieldName }}`: a field variable
//! - `{{if .IsOptional}}…{{else}}…{{end}}`, `{{if not .IsOptional}}…{{end}}`
//!
//! Variables: `.FieldName` (wire name), `.FieldIdent`, `.IsOptional`, `.IsPointer`,
//! `.OmitEmpty`. Templates that fail to parse are skipped.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const DEFAULT_TEMPLATE: &str = "{{ .FieldName }}{{if .IsOptional}},omitempty{{end}}";

/// A named tag template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTag {
    /// Tag key (`json`, `form`, ...).
    pub name: String,
    /// Template source.
    pub template: String,
}

/// Ordered tag template set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructTagsConfig {
    /// Templates in output order.
    pub tags: Vec<StructTag>,
}

impl Default for StructTagsConfig {
    fn default() -> Self {
        Self {
            tags: ["json", "form"]
                .iter()
                .map(|name| StructTag {
                    name: name.to_string(),
                    template: DEFAULT_TEMPLATE.to_string(),
                })
                .collect(),
        }
    }
}

impl StructTagsConfig {
    /// User tags replace same-named entries in place; new ones are appended.
    pub fn merge(&self, user: &StructTagsConfig) -> StructTagsConfig {
        let mut tags = self.tags.clone();
        for tag in &user.tags {
            match tags.iter_mut().find(|t| t.name == tag.name) {
                Some(existing) => existing.template = tag.template.clone(),
                None => tags.push(tag.clone()),
            }
        }
        StructTagsConfig { tags }
    }
}

/// Values a template can read.
#[derive(Debug, Clone)]
pub struct TagData<'a> {
    /// Wire name.
    pub field_name: &'a str,
    /// Mangled identifier.
    pub field_ident: &'a str,
    /// Not required.
    pub is_optional: bool,
    /// Held through a pointer / `Option`.
    pub is_pointer: bool,
    /// Omitted when empty.
    pub omit_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    FieldName,
    FieldIdent,
    IsOptional,
    IsPointer,
    OmitEmpty,
}

impl Var {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            ".FieldName" => Some(Var::FieldName),
            ".FieldIdent" => Some(Var::FieldIdent),
            ".IsOptional" => Some(Var::IsOptional),
            ".IsPointer" => Some(Var::IsPointer),
            ".OmitEmpty" => Some(Var::OmitEmpty),
            _ => None,
        }
    }

    fn text(self, data: &TagData<'_>) -> String {
        match self {
            Var::FieldName => data.field_name.to_string(),
            Var::FieldIdent => data.field_ident.to_string(),
            other => other.truthy(data).to_string(),
        }
    }

    fn truthy(self, data: &TagData<'_>) -> bool {
        match self {
            Var::FieldName => !data.field_name.is_empty(),
            Var::FieldIdent => !data.field_ident.is_empty(),
            Var::IsOptional => data.is_optional,
            Var::IsPointer => data.is_pointer,
            Var::OmitEmpty => data.omit_empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(Var),
    If {
        var: Var,
        negate: bool,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum Action {
    Var(Var),
    If(Var, bool),
    Else,
    End,
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{-?\s*(.*?)\s*-?\}\}").expect("Invalid regex"))
}

fn parse_action(raw: &str) -> Result<Action, String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let parse_var = |w: &str| Var::parse(w).ok_or_else(|| format!("unknown variable '{w}'"));
    match words.as_slice() {
        ["if", "not", var] => Ok(Action::If(parse_var(*var)?, true)),
        ["if", var] => Ok(Action::If(parse_var(*var)?, false)),
        ["else"] => Ok(Action::Else),
        ["end"] => Ok(Action::End),
        [var] => Ok(Action::Var(parse_var(*var)?)),
        _ => Err(format!("unsupported action '{raw}'")),
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct TagTemplate {
    nodes: Vec<Node>,
}

impl TagTemplate {
    /// Parses template source.
    pub fn parse(source: &str) -> Result<Self, String> {
        // Each frame: (nodes collected so far, pending if header, then-branch once `else` seen).
        type Frame = (Vec<Node>, Option<(Var, bool)>, Option<Vec<Node>>);
        let mut stack: Vec<Frame> = vec![(Vec::new(), None, None)];
        let mut last = 0;

        let push_text = |stack: &mut Vec<Frame>, text: &str| -> Result<(), String> {
            if text.contains("{{") || text.contains("}}") {
                return Err("unbalanced delimiters".to_string());
            }
            if !text.is_empty() {
                if let Some(frame) = stack.last_mut() {
                    frame.0.push(Node::Text(text.to_string()));
                }
            }
            Ok(())
        };

        for caps in action_regex().captures_iter(source) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_text(&mut stack, &source[last..whole.start()])?;
            last = whole.end();

            match parse_action(inner.as_str())? {
                Action::Var(var) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.0.push(Node::Var(var));
                    }
                }
                Action::If(var, negate) => stack.push((Vec::new(), Some((var, negate)), None)),
                Action::Else => match stack.last_mut() {
                    Some(frame) if frame.1.is_some() && frame.2.is_none() => {
                        frame.2 = Some(std::mem::take(&mut frame.0));
                    }
                    _ => return Err("'else' outside of 'if'".to_string()),
                },
                Action::End => {
                    if stack.len() < 2 {
                        return Err("'end' without 'if'".to_string());
                    }
                    let Some((nodes, Some((var, negate)), then)) = stack.pop() else {
                        return Err("'end' without 'if'".to_string());
                    };
                    let node = match then {
                        Some(then) => Node::If {
                            var,
                            negate,
                            then,
                            otherwise: nodes,
                        },
                        None => Node::If {
                            var,
                            negate,
                            then: nodes,
                            otherwise: Vec::new(),
                        },
                    };
                    if let Some(frame) = stack.last_mut() {
                        frame.0.push(node);
                    }
                }
            }
        }
        push_text(&mut stack, &source[last..])?;

        if stack.len() != 1 {
            return Err("unterminated 'if'".to_string());
        }
        let nodes = stack.pop().map(|f| f.0).unwrap_or_default();
        Ok(Self { nodes })
    }

    /// Renders against one field.
    pub fn render(&self, data: &TagData<'_>) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, data, &mut out);
        out
    }
}

fn render_nodes(nodes: &[Node], data: &TagData<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(var) => out.push_str(&var.text(data)),
            Node::If {
                var,
                negate,
                then,
                otherwise,
            } => {
                if var.truthy(data) != *negate {
                    render_nodes(then, data, out);
                } else {
                    render_nodes(otherwise, data, out);
                }
            }
        }
    }
}

/// Compiled tag set.
#[derive(Debug, Clone)]
pub struct StructTagRenderer {
    templates: Vec<(String, TagTemplate)>,
}

impl StructTagRenderer {
    /// Compiles every template, dropping the ones that do not parse.
    pub fn new(config: &StructTagsConfig) -> Self {
        let templates = config
            .tags
            .iter()
            .filter_map(|tag| match TagTemplate::parse(&tag.template) {
                Ok(template) => Some((tag.name.clone(), template)),
                Err(reason) => {
                    tracing::debug!(tag = %tag.name, %reason, "skipping struct tag template");
                    None
                }
            })
            .collect();
        Self { templates }
    }

    /// Renders all tags for one field; empty results are left out.
    ///
    /// `omit_empty_override` forces `,omitempty` on or off for `json` and `form` tags.
    pub fn render(
        &self,
        data: &TagData<'_>,
        omit_empty_override: Option<bool>,
    ) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        for (name, template) in &self.templates {
            let mut value = template.render(data);
            if matches!(name.as_str(), "json" | "form") {
                match omit_empty_override {
                    Some(true) if !value.contains(",omitempty") => value.push_str(",omitempty"),
                    Some(false) => value = value.replace(",omitempty", ""),
                    _ => {}
                }
            }
            if !value.is_empty() {
                out.insert(name.clone(), value);
            }
        }
        out
    }
}
