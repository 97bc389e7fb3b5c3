//! Adapter trait: the contract adapters implement
//!
//! An adapter accepts one configuration value and asynchronously produces
//! one report. Both are serde types so the pipeline can merge configs and
//! collect reports as JSON without knowing the concrete types.

use super::error::AdapterError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The contract adapters implement.
///
/// Invocations share no mutable state through the trait; an adapter that
/// needs state across runs owns it behind its own synchronization.
///
/// # Example
///
/// ```ignore
/// struct Echo;
///
/// #[async_trait]
/// impl Adapter for Echo {
///     type Config = String;
///     type Report = String;
///
///     fn id(&self) -> &str { "echo" }
///
///     async fn run(&self, config: String) -> Result<String, AdapterError> {
///         Ok(config)
///     }
/// }
/// ```
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Configuration accepted by `run`
    type Config: Serialize + DeserializeOwned + Send + 'static;

    /// Report produced by `run`
    type Report: Serialize + Send + 'static;

    /// Stable identifier, used in logs
    fn id(&self) -> &str;

    /// Check a decoded config before any adapter in the pipeline starts.
    ///
    /// Runs at registration, on `set_config` and ahead of every run.
    fn validate(&self, _config: &Self::Config) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Execute once with `config`.
    ///
    /// Returns `Err(AdapterError::InvalidInput)` when the config is
    /// unusable, and an execution error when the work itself fails.
    async fn run(&self, config: Self::Config) -> Result<Self::Report, AdapterError>;
}
