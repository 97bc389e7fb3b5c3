//! K6Adapter: runs a k6 script and sanitizes its JSON output
//!
//! The run writes its raw event stream to a temp file (`--out json=..`),
//! which is read back through the sanitizer once the process exits.
//! Temp files are removed when the run finishes, successfully or not.

use super::error::AdapterError;
use super::traits::Adapter;
use crate::sanitize::{SanitizedRun, Sanitizer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use uuid::Uuid;

const DEFAULT_BINARY: &str = "k6";

/// How much of stderr to keep in an execution error.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct K6Config {
    /// Script passed to `k6 run`
    pub script: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vus: Option<u32>,
    /// Duration string understood by k6, e.g. "30s"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    /// Passed as `-e KEY=VALUE`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Scenario definitions, handed to k6 through a `--config` file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<BTreeMap<String, Value>>,
    /// Extra arguments inserted before the script
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Executable to invoke instead of `k6` from PATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

impl K6Config {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    pub fn with_vus(mut self, vus: u32) -> Self {
        self.vus = Some(vus);
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Reject configs k6 would choke on, before anything is spawned.
    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.script.as_os_str().is_empty() {
            return Err(AdapterError::invalid("script is required"));
        }
        if self.vus == Some(0) {
            return Err(AdapterError::invalid("vus must be greater than zero"));
        }
        if self.iterations == Some(0) {
            return Err(AdapterError::invalid("iterations must be greater than zero"));
        }
        if matches!(&self.duration, Some(d) if d.trim().is_empty()) {
            return Err(AdapterError::invalid("duration must not be empty"));
        }
        if let Some(scenarios) = &self.scenarios {
            for (name, scenario) in scenarios {
                if !scenario.is_object() {
                    return Err(AdapterError::invalid(format!(
                        "scenario '{}' must be an object",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn binary(&self) -> &str {
        self.binary.as_deref().unwrap_or(DEFAULT_BINARY)
    }

    /// Arguments for `k6`, writing events to `out` and reading options from
    /// `options` when given.
    pub fn command_args(&self, out: &Path, options: Option<&Path>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["run".into(), "--out".into()];

        let mut out_arg = OsString::from("json=");
        out_arg.push(out);
        args.push(out_arg);

        if let Some(options) = options {
            args.push("--config".into());
            args.push(options.into());
        }
        if let Some(vus) = self.vus {
            args.push("--vus".into());
            args.push(vus.to_string().into());
        }
        if let Some(duration) = &self.duration {
            args.push("--duration".into());
            args.push(duration.into());
        }
        if let Some(iterations) = self.iterations {
            args.push("--iterations".into());
            args.push(iterations.to_string().into());
        }
        for (key, value) in &self.env {
            args.push("-e".into());
            args.push(format!("{}={}", key, value).into());
        }
        args.extend(self.args.iter().map(OsString::from));
        args.push(self.script.clone().into());
        args
    }
}

/// Removes its file on drop.
struct TempFile(PathBuf);

impl TempFile {
    fn new(suffix: &str) -> Self {
        Self(std::env::temp_dir().join(format!("loadpipe-{}-{}", Uuid::new_v4(), suffix)))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // The generator may not have created it.
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Runs k6 and returns the sanitized metrics of the run.
#[derive(Debug, Default)]
pub struct K6Adapter;

impl K6Adapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Adapter for K6Adapter {
    type Config = K6Config;
    type Report = SanitizedRun;

    fn id(&self) -> &str {
        "k6"
    }

    fn validate(&self, config: &K6Config) -> Result<(), AdapterError> {
        config.validate()
    }

    async fn run(&self, config: K6Config) -> Result<SanitizedRun, AdapterError> {
        config.validate()?;

        let out = TempFile::new("events.json");
        let options = match &config.scenarios {
            Some(scenarios) => {
                let file = TempFile::new("options.json");
                let body = serde_json::json!({ "scenarios": scenarios });
                tokio::fs::write(file.path(), serde_json::to_vec(&body)?).await?;
                Some(file)
            }
            None => None,
        };

        let args = config.command_args(out.path(), options.as_ref().map(TempFile::path));
        tracing::info!(
            adapter = self.id(),
            binary = config.binary(),
            script = %config.script.display(),
            "starting load run"
        );
        tracing::debug!(args = ?args, "k6 arguments");

        let output = Command::new(config.binary())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AdapterError::Execution(format!("failed to start '{}': {}", config.binary(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::Execution(format!(
                "k6 exited with {}: {}",
                output.status,
                tail(&stderr, STDERR_TAIL_LINES)
            )));
        }
        tracing::info!(adapter = self.id(), status = %output.status, "load run finished");

        let raw = tokio::fs::read_to_string(out.path()).await?;
        Ok(Sanitizer::from_ndjson(&raw)?.into_run())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
