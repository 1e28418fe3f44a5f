//! Rendering of resolved components

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::resolve::Resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Dotenv,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dotenv" | "env" => Ok(OutputFormat::Dotenv),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Invalid format: {}. Please specify 'dotenv', 'json' or 'yaml'",
                s
            )),
        }
    }
}

/// What to print for each component
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print every candidate, oldest first, instead of the current version
    pub enumerate: bool,
    /// Print full versions (`repo-id + delimiter + version`)
    pub full_version: bool,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Output value of every resolved component, in resolution order
///
/// Unresolved components are left out.
pub fn output_values(
    resolutions: &IndexMap<String, Resolution>,
    options: OutputOptions,
) -> IndexMap<String, Value> {
    let pick = |row: &crate::version::row::Row| {
        if options.full_version {
            row.full_version.clone()
        } else {
            row.version.clone()
        }
    };

    resolutions
        .iter()
        .filter_map(|(name, resolution)| {
            let value = if options.enumerate {
                let all = resolution.candidates.iter().map(pick).map(Value::String);
                Value::Array(all.collect())
            } else {
                Value::String(pick(resolution.current()?))
            };
            Some((name.clone(), value))
        })
        .filter(|(_, value)| value.as_array().is_none_or(|all| !all.is_empty()))
        .collect()
}

/// Renders resolved components in `format`
pub fn render(
    resolutions: &IndexMap<String, Resolution>,
    format: OutputFormat,
    options: OutputOptions,
) -> Result<String, OutputError> {
    let values = output_values(resolutions, options);
    match format {
        OutputFormat::Dotenv => Ok(render_dotenv(&values)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&values)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&values)?),
    }
}

fn render_dotenv(values: &IndexMap<String, Value>) -> String {
    values
        .iter()
        .map(|(name, value)| {
            let text = match value {
                Value::Array(all) => all
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}\n", name, quote_dotenv(&text))
        })
        .collect()
}

fn quote_dotenv(value: &str) -> String {
    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
