//! StreamAdapter: sanitizes an event stream recorded by an earlier run

use super::error::AdapterError;
use super::traits::Adapter;
use crate::sanitize::{SanitizedRun, Sanitizer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Newline-delimited JSON file written by the load generator
    pub path: PathBuf,
}

impl StreamConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Reads a recorded event stream and returns its sanitized reports.
#[derive(Debug, Default)]
pub struct StreamAdapter;

impl StreamAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Adapter for StreamAdapter {
    type Config = StreamConfig;
    type Report = SanitizedRun;

    fn id(&self) -> &str {
        "stream"
    }

    fn validate(&self, config: &StreamConfig) -> Result<(), AdapterError> {
        if config.path.as_os_str().is_empty() {
            return Err(AdapterError::invalid("stream path is empty"));
        }
        Ok(())
    }

    async fn run(&self, config: StreamConfig) -> Result<SanitizedRun, AdapterError> {
        self.validate(&config)?;
        let raw = tokio::fs::read_to_string(&config.path).await?;
        Ok(Sanitizer::from_ndjson(&raw)?.into_run())
    }
}
