#![deny(missing_docs)]

//! # oasgraph CLI
//!
//! Command line driver for the OpenAPI descriptor resolver.
//!
//! Supported Commands:
//! - `resolve`: Resolves a document and writes the descriptor model (JSON or YAML).
//! - `names`: Prints the final name of every schema descriptor and operation.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod error;
mod names;
mod resolve;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI descriptor resolver")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a document into the descriptor model.
    Resolve(resolve::ResolveArgs),
    /// List resolved type names and operation ids.
    Names(names::NamesArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing();

    match &cli.command {
        Commands::Resolve(args) => resolve::execute(args)?,
        Commands::Names(args) => names::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_args() {
        let cli = Cli::try_parse_from([
            "oasgraph",
            "resolve",
            "--spec",
            "api.yaml",
            "--format",
            "yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.input.spec.to_string_lossy(), "api.yaml");
                assert_eq!(args.format, resolve::OutputFormat::Yaml);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_names_args() {
        let cli = Cli::try_parse_from(["oasgraph", "names", "--spec", "api.yaml"]).unwrap();
        match cli.command {
            Commands::Names(args) => {
                assert_eq!(args.format, names::NamesFormat::Text);
                assert!(args.input.config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
