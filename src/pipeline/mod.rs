//! Adapter pipeline
//!
//! A registry pairing each adapter key with an adapter and its default
//! configuration, plus the orchestration that runs them.
//!
//! A run:
//! 1. Deep-merges the caller's overrides onto the stored config map
//! 2. Skips every adapter whose merged config is falsy
//! 3. Validates the remaining configs, before any adapter starts
//! 4. Runs the adapters one after another in registration order, or all
//!    together when `run_in_parallel` is set
//! 5. Returns `{key: report | null}` in registration order

mod options;
mod result;


pub use options::RunOptions;
pub use result::{AdapterOutcome, PipelineOutcome, PipelineResult};

use crate::adapter::{Adapter, AdapterError, Erased, ErasedAdapter};
use crate::merge::{deep_merge, is_truthy};
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors from building or running a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("adapter not registered: {0}")]
    UnknownAdapter(String),

    #[error("invalid config for adapter '{key}': {source}")]
    InvalidConfig {
        key: String,
        #[source]
        source: AdapterError,
    },

    #[error("overrides must be an object keyed by adapter, got {0}")]
    InvalidOverrides(String),

    #[error("adapter '{key}' failed: {source}")]
    AdapterFailed {
        key: String,
        #[source]
        source: AdapterError,
    },
}

impl PipelineError {
    /// Adapter key the error originated from, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnknownAdapter(key)
            | Self::InvalidConfig { key, .. }
            | Self::AdapterFailed { key, .. } => Some(key),
            Self::InvalidOverrides(_) => None,
        }
    }
}

pub type PipelineRunResult<T> = Result<T, PipelineError>;

#[derive(Clone)]
struct Registration {
    key: String,
    adapter: Arc<dyn ErasedAdapter>,
}

enum Step {
    Run {
        key: String,
        adapter: Arc<dyn ErasedAdapter>,
        config: Value,
    },
    Skip {
        key: String,
    },
}

/// Registry and orchestrator for adapters.
///
/// Registration is persistent: [`Pipeline::add_adapter`] returns a new
/// pipeline and leaves the receiver untouched. [`Pipeline::set_config`] is
/// the one in-place mutation.
#[derive(Clone, Default)]
pub struct Pipeline {
    adapters: Vec<Registration>,
    config: Map<String, Value>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a pipeline extended with `adapter` under `key`.
    ///
    /// An existing key is overwritten in place, adapter and config both,
    /// keeping its position. Without a config the adapter is stored with
    /// `null` and stays skipped until a config or override enables it.
    pub fn add_adapter<A>(
        &self,
        key: impl Into<String>,
        adapter: A,
        config: Option<A::Config>,
    ) -> PipelineRunResult<Self>
    where
        A: Adapter + 'static,
    {
        let key = key.into();
        let adapter: Arc<dyn ErasedAdapter> = Arc::new(Erased(adapter));

        let config = match config {
            Some(config) => serde_json::to_value(config).map_err(|e| PipelineError::InvalidConfig {
                key: key.clone(),
                source: e.into(),
            })?,
            None => Value::Null,
        };
        check(&key, adapter.as_ref(), &config)?;

        let mut next = self.clone();
        let registration = Registration {
            key: key.clone(),
            adapter,
        };
        match next.adapters.iter_mut().find(|r| r.key == key) {
            Some(existing) => *existing = registration,
            None => next.adapters.push(registration),
        }
        next.config.insert(key, config);
        Ok(next)
    }

    /// Replace the stored config of a registered adapter.
    pub fn set_config(
        &mut self,
        key: &str,
        value: impl Serialize,
    ) -> PipelineRunResult<&mut Self> {
        let adapter = self
            .adapter(key)
            .ok_or_else(|| PipelineError::UnknownAdapter(key.to_string()))?;
        let value = serde_json::to_value(value).map_err(|e| PipelineError::InvalidConfig {
            key: key.to_string(),
            source: e.into(),
        })?;
        check(key, adapter.as_ref(), &value)?;

        self.config.insert(key.to_string(), value);
        Ok(self)
    }

    /// The stored config map.
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn config_for(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|r| r.key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.adapter(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Run every enabled adapter, failing fast.
    ///
    /// Sequentially, a failure leaves the remaining adapters unstarted. In
    /// parallel, the first failure resolves the run and the other in-flight
    /// adapters are dropped.
    pub async fn run(
        &self,
        overrides: Option<&Value>,
        options: &RunOptions,
    ) -> PipelineRunResult<PipelineResult> {
        let steps = self.plan(overrides, options)?;
        let mut entries: Vec<(String, Option<Value>)> = Vec::with_capacity(steps.len());

        if options.run_in_parallel {
            let mut slots = Vec::new();
            let mut pending = Vec::new();
            for step in steps {
                match step {
                    Step::Run { key, adapter, config } => {
                        slots.push(entries.len());
                        entries.push((key.clone(), None));
                        pending.push(async move {
                            let result = execute(&key, adapter.as_ref(), config).await;
                            result.map_err(|source| PipelineError::AdapterFailed { key, source })
                        });
                    }
                    Step::Skip { key } => entries.push((key, None)),
                }
            }

            let reports = try_join_all(pending).await?;
            for (slot, report) in slots.into_iter().zip(reports) {
                entries[slot].1 = Some(report);
            }
        } else {
            for step in steps {
                match step {
                    Step::Run { key, adapter, config } => {
                        let result = execute(&key, adapter.as_ref(), config).await;
                        match result {
                            Ok(report) => entries.push((key, Some(report))),
                            Err(source) => return Err(PipelineError::AdapterFailed { key, source }),
                        }
                    }
                    Step::Skip { key } => entries.push((key, None)),
                }
            }
        }

        Ok(PipelineResult::new(entries))
    }

    /// Run every enabled adapter and record each outcome, failures included.
    ///
    /// Invalid configs still abort before anything starts.
    pub async fn run_collect(
        &self,
        overrides: Option<&Value>,
        options: &RunOptions,
    ) -> PipelineRunResult<PipelineOutcome> {
        let steps = self.plan(overrides, options)?;

        let entries = if options.run_in_parallel {
            join_all(steps.into_iter().map(|step| async move {
                match step {
                    Step::Run { key, adapter, config } => {
                        let result = execute(&key, adapter.as_ref(), config).await;
                        (key, outcome_of(result))
                    }
                    Step::Skip { key } => (key, AdapterOutcome::Skipped),
                }
            }))
            .await
        } else {
            let mut entries = Vec::with_capacity(steps.len());
            for step in steps {
                match step {
                    Step::Run { key, adapter, config } => {
                        let result = execute(&key, adapter.as_ref(), config).await;
                        entries.push((key, outcome_of(result)));
                    }
                    Step::Skip { key } => entries.push((key, AdapterOutcome::Skipped)),
                }
            }
            entries
        };

        Ok(PipelineOutcome::new(entries))
    }

    fn adapter(&self, key: &str) -> Option<&Arc<dyn ErasedAdapter>> {
        self.adapters
            .iter()
            .find(|r| r.key == key)
            .map(|r| &r.adapter)
    }

    fn merged_config(&self, overrides: Option<&Value>) -> PipelineRunResult<Value> {
        let stored = Value::Object(self.config.clone());
        match overrides {
            None => Ok(stored),
            Some(overrides @ Value::Object(_)) => Ok(deep_merge(&stored, overrides)),
            Some(other) => Err(PipelineError::InvalidOverrides(json_kind(other).to_string())),
        }
    }

    fn plan(&self, overrides: Option<&Value>, options: &RunOptions) -> PipelineRunResult<Vec<Step>> {
        if options.timeout.is_some() || options.save_raw {
            tracing::debug!(
                timeout_ms = ?options.timeout,
                save_raw = options.save_raw,
                "timeout and save_raw are reserved and have no effect"
            );
        }

        let merged = self.merged_config(overrides)?;
        let mut steps = Vec::with_capacity(self.adapters.len());

        for registration in &self.adapters {
            let key = registration.key.clone();
            let config = merged.get(&key).cloned().unwrap_or(Value::Null);

            if is_truthy(&config) {
                check(&key, registration.adapter.as_ref(), &config)?;
                steps.push(Step::Run {
                    key,
                    adapter: registration.adapter.clone(),
                    config,
                });
            } else {
                tracing::debug!(adapter = %key, "config is falsy, skipping");
                steps.push(Step::Skip { key });
            }
        }

        Ok(steps)
    }
}

/// Validate a truthy config against the adapter's config type.
fn check(key: &str, adapter: &dyn ErasedAdapter, config: &Value) -> PipelineRunResult<()> {
    if !is_truthy(config) {
        return Ok(());
    }
    adapter
        .check_config(config)
        .map_err(|source| PipelineError::InvalidConfig {
            key: key.to_string(),
            source,
        })
}

async fn execute(key: &str, adapter: &dyn ErasedAdapter, config: Value) -> Result<Value, AdapterError> {
    let started = Instant::now();
    tracing::debug!(adapter = %key, id = adapter.id(), "adapter starting");

    let result = adapter.run_json(config).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => tracing::info!(adapter = %key, elapsed_ms, "adapter completed"),
        Err(e) => tracing::warn!(adapter = %key, elapsed_ms, error = %e, "adapter failed"),
    }
    result
}

fn outcome_of(result: Result<Value, AdapterError>) -> AdapterOutcome {
    match result {
        Ok(report) => AdapterOutcome::Completed(report),
        Err(e) => AdapterOutcome::Failed(e),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
