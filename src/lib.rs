//! loadpipe: Adapter Pipelines for Load-Test Metrics
//!
//! Composes independent adapters, units that take a typed configuration
//! and asynchronously produce a typed report, into a single pipeline, and
//! sanitizes the raw event stream of a load-generation run into structured
//! per-metric reports.
//!
//! # Core Concepts
//!
//! - **Adapters**: implement [`Adapter`]; one config in, one report out
//! - **Pipeline**: registry of adapters and their default configs; merges
//!   overrides, skips disabled adapters, runs the rest sequentially or together
//! - **Sanitizer**: two-pass processing of metric definitions and data points
//!   into reports with summaries
//!
//! # Example
//!
//! ```no_run
//! use loadpipe::{K6Adapter, K6Config, Pipeline, RunOptions};
//!
//! # async fn example() -> Result<(), loadpipe::PipelineError> {
//! let pipeline = Pipeline::new().add_adapter(
//!     "smoke",
//!     K6Adapter::new(),
//!     Some(K6Config::new("load.js").with_vus(5).with_duration("10s")),
//! )?;
//!
//! let result = pipeline.run(None, &RunOptions::sequential()).await?;
//! println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod merge;
pub mod pipeline;
pub mod sanitize;

pub use adapter::{Adapter, AdapterError, K6Adapter, K6Config, StreamAdapter, StreamConfig};
pub use merge::{deep_merge, is_truthy};
pub use pipeline::{
    AdapterOutcome, Pipeline, PipelineError, PipelineOutcome, PipelineResult, RunOptions,
};
pub use sanitize::{
    MetricDigest, MetricKind, MetricOverview, MetricReport, Point, RawEvent, SanitizeError,
    SanitizedRun, Sanitizer, Summary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
