#![deny(missing_docs)]

//! # Names Command
//!
//! Prints the final name of every schema descriptor and the mangled id of every
//! operation, for checking naming decisions without reading the full model.

use oasgraph_core::{ResolvedApi, Shape};
use serde::Serialize;

use crate::error::CliResult;
use crate::resolve::{load, InputArgs};

/// Listing format.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamesFormat {
    /// Aligned text table.
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// Arguments for the names command.
#[derive(clap::Args, Debug, Clone)]
pub struct NamesArgs {
    /// Inputs.
    #[clap(flatten)]
    pub input: InputArgs,

    /// Listing format.
    #[clap(long, value_enum, default_value_t = NamesFormat::Text)]
    pub format: NamesFormat,
}

#[derive(Debug, Serialize)]
struct SchemaRow<'a> {
    name: &'a str,
    section: String,
    shape: &'static str,
    path: String,
}

#[derive(Debug, Serialize)]
struct OperationRow<'a> {
    method: &'a str,
    path: &'a str,
    operation_id: &'a str,
    mangled_id: &'a str,
    simple: bool,
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    schemas: Vec<SchemaRow<'a>>,
    operations: Vec<OperationRow<'a>>,
}

fn shape_kind(shape: Option<&Shape>) -> &'static str {
    match shape {
        Some(Shape::Struct(_)) => "struct",
        Some(Shape::Alias { .. }) => "alias",
        Some(Shape::Array { .. }) => "array",
        Some(Shape::UnionWrapper(_)) => "union",
        Some(Shape::NullableWrapper { .. }) => "nullable",
        None => "-",
    }
}

fn listing(api: &ResolvedApi) -> Listing<'_> {
    Listing {
        schemas: api
            .schemas()
            .map(|d| SchemaRow {
                name: d.final_name().unwrap_or_default(),
                section: d.section.to_string(),
                shape: shape_kind(d.shape()),
                path: d.path.to_pointer(),
            })
            .collect(),
        operations: api
            .operations()
            .iter()
            .map(|op| OperationRow {
                method: &op.method,
                path: &op.path_template,
                operation_id: &op.operation_id,
                mangled_id: &op.mangled_id,
                simple: op.simple,
            })
            .collect(),
    }
}

/// Renders the listing.
pub fn render(api: &ResolvedApi, format: NamesFormat) -> CliResult<String> {
    let listing = listing(api);
    if format == NamesFormat::Json {
        return Ok(serde_json::to_string_pretty(&listing)?);
    }

    let width = listing
        .schemas
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0);
    let mut out = String::from("schemas:\n");
    for row in &listing.schemas {
        out.push_str(&format!(
            "  {:<width$}  {:<16}  {:<8}  {}\n",
            row.name,
            row.section,
            row.shape,
            row.path,
            width = width
        ));
    }
    out.push_str("operations:\n");
    for row in &listing.operations {
        let simple = if row.simple { " (simple)" } else { "" };
        out.push_str(&format!(
            "  {} {}  {} -> {}{}\n",
            row.method, row.path, row.operation_id, row.mangled_id, simple
        ));
    }
    Ok(out)
}

/// Executes the names command.
pub fn execute(args: &NamesArgs) -> CliResult<()> {
    let api = load(&args.input)?;
    print!("{}", render(&api, args.format)?);
    Ok(())
}
