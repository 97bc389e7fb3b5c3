//! Pipeline files and CLI overrides
//!
//! A pipeline file lists adapters in registration order, each with a kind
//! and its default config, plus the run options:
//!
//! ```yaml
//! run_in_parallel: false
//! adapters:
//!   - key: smoke
//!     kind: k6
//!     config:
//!       script: load.js
//!       vus: 5
//!       duration: 10s
//!   - key: baseline
//!     kind: stream
//!     config:
//!       path: baseline.json
//! ```
//!
//! JSON is accepted too, being a subset of YAML.

use crate::adapter::{K6Adapter, StreamAdapter};
use crate::merge::merge_into;
use crate::pipeline::{Pipeline, PipelineError, RunOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse pipeline: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid override: {0}")]
    InvalidOverride(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Built-in adapter kinds a pipeline file can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    K6,
    Stream,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub key: String,
    pub kind: AdapterKind,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineFile {
    #[serde(flatten)]
    pub options: RunOptions,
    #[serde(default)]
    pub adapters: Vec<AdapterSpec>,
}

impl PipelineFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = read(path)?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Register every listed adapter with its config.
    pub fn build(&self) -> Result<Pipeline, PipelineError> {
        let mut pipeline = Pipeline::new();
        for spec in &self.adapters {
            pipeline = match spec.kind {
                AdapterKind::K6 => pipeline.add_adapter(spec.key.as_str(), K6Adapter::new(), None)?,
                AdapterKind::Stream => {
                    pipeline.add_adapter(spec.key.as_str(), StreamAdapter::new(), None)?
                }
            };
            pipeline.set_config(&spec.key, &spec.config)?;
        }
        Ok(pipeline)
    }
}

/// Load an override file: a mapping from adapter key to config.
pub fn load_overrides(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    let raw = read(path)?;
    let value: Value = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ConfigError::InvalidOverride(format!(
            "{} must contain a mapping keyed by adapter",
            path.display()
        ))),
    }
}

/// Parse `a.b.c=value` into `{"a": {"b": {"c": value}}}`.
///
/// The value is read as JSON when it parses, as a plain string otherwise.
pub fn parse_assignment(expr: &str) -> Result<Value, ConfigError> {
    let (path, raw) = expr
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(format!("expected key=value, got '{}'", expr)))?;

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::InvalidOverride(format!("empty key segment in '{}'", path)));
    }

    let mut value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    for segment in segments.into_iter().rev() {
        let mut map = Map::new();
        map.insert(segment.to_string(), value);
        value = Value::Object(map);
    }
    Ok(value)
}

/// Fold override files and `key=value` assignments, later ones winning.
pub fn collect_overrides(files: &[PathBuf], assignments: &[String]) -> Result<Option<Value>, ConfigError> {
    if files.is_empty() && assignments.is_empty() {
        return Ok(None);
    }
    let mut merged = Value::Object(Map::new());
    for file in files {
        merge_into(&mut merged, &load_overrides(file)?);
    }
    for assignment in assignments {
        merge_into(&mut merged, &parse_assignment(assignment)?);
    }
    Ok(Some(merged))
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
