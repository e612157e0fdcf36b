#![deny(missing_docs)]

//! # Resolve Command
//!
//! Loads a document (and optional resolver configuration), runs the pipeline and
//! writes the resolved model.

use std::fs;
use std::path::{Path, PathBuf};

use oasgraph_core::{resolve_yaml, ResolvedApi, ResolverConfig};

use crate::error::{CliError, CliResult};

/// Document and configuration inputs shared by all commands.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the OpenAPI document (YAML or JSON).
    #[clap(long, env = "OASGRAPH_SPEC")]
    pub spec: PathBuf,

    /// Path to a resolver configuration file (YAML).
    #[clap(long, env = "OASGRAPH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Serialization of the resolved model.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Arguments for the resolve command.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Inputs.
    #[clap(flatten)]
    pub input: InputArgs,

    /// Output file; stdout when absent.
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

fn read(path: &Path, what: &str) -> CliResult<String> {
    if !path.exists() {
        return Err(CliError::General(format!("{} not found: {:?}", what, path)));
    }
    Ok(fs::read_to_string(path)?)
}

/// Loads the inputs and runs the resolver.
pub fn load(input: &InputArgs) -> CliResult<ResolvedApi> {
    let config = match &input.config {
        Some(path) => ResolverConfig::from_yaml_str(&read(path, "Config file")?)?,
        None => ResolverConfig::default(),
    };
    let source = read(&input.spec, "OpenAPI file")?;
    tracing::info!(spec = ?input.spec, "resolving");
    Ok(resolve_yaml(&source, &config)?)
}

/// Renders the resolved model.
pub fn render(api: &ResolvedApi, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(api)?,
        OutputFormat::Yaml => serde_yaml::to_string(api)?,
    })
}

/// Executes the resolve command.
pub fn execute(args: &ResolveArgs) -> CliResult<()> {
    let api = load(&args.input)?;
    let rendered = render(&api, args.format)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            tracing::info!(output = ?path, "wrote resolved model");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const SPEC: &str = r#"
openapi: 3.1.0
info: {title: T, version: '1.0'}
paths:
  /health:
    get:
      operationId: getHealth
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema:
                type: object
                properties:
                  status:
                    type: string
"#;

    #[test]
    fn test_execute_writes_json() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("openapi.yaml");
        let output = dir.path().join("out/model.json");
        fs::write(&spec, SPEC).unwrap();

        let args = ResolveArgs {
            input: InputArgs { spec, config: None },
            output: Some(output.clone()),
            format: OutputFormat::Json,
        };
        execute(&args).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["operations"][0]["mangled_id"], "GetHealth");
        assert_eq!(written["schemas"][0]["final_name"], "GetHealthJSONResponse");
        assert_eq!(written["schemas"][1]["final_name"], "GetHealthJSONResponseStatus");
    }

    #[test]
    fn test_config_changes_mapping() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("openapi.yaml");
        let config = dir.path().join("oasgraph.yaml");
        fs::write(&spec, SPEC).unwrap();
        fs::write(
            &config,
            "type_mapping:\n  string:\n    default: { type: smol_str::SmolStr, import: smol_str }\n",
        )
        .unwrap();

        let api = load(&InputArgs {
            spec,
            config: Some(config),
        })
        .unwrap();
        let status = api.schema_named("GetHealthJSONResponseStatus").unwrap();
        assert!(status.shape().is_some());
        assert_eq!(api.context().imports(), vec!["smol_str"]);
        let rendered = render(&api, OutputFormat::Yaml).unwrap();
        assert!(rendered.contains("smol_str::SmolStr"));
    }

    #[test]
    fn test_missing_spec() {
        let dir = tempdir().unwrap();
        let args = ResolveArgs {
            input: InputArgs {
                spec: dir.path().join("missing.yaml"),
                config: None,
            },
            output: None,
            format: OutputFormat::Json,
        };
        let err = execute(&args).unwrap_err();
        assert!(err.to_string().contains("OpenAPI file not found"));
    }

    #[test]
    fn test_invalid_document_is_reported() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("swagger.yaml");
        fs::write(&spec, "swagger: '2.0'\n").unwrap();
        let err = load(&InputArgs { spec, config: None }).unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
    }
}
