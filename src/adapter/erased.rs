//! JSON-level view of an adapter
//!
//! The pipeline stores adapters with different `Config`/`Report` types in
//! one registry. Each is wrapped so that configs go in and reports come
//! out as `serde_json::Value`, with the decode step doubling as validation.

use super::error::AdapterError;
use super::traits::Adapter;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[async_trait]
pub(crate) trait ErasedAdapter: Send + Sync {
    fn id(&self) -> &str;

    /// Check that `config` decodes into the adapter's config type and passes
    /// the adapter's own validation.
    fn check_config(&self, config: &Value) -> Result<(), AdapterError>;

    async fn run_json(&self, config: Value) -> Result<Value, AdapterError>;
}

pub(crate) struct Erased<A>(pub A);

#[async_trait]
impl<A: Adapter> ErasedAdapter for Erased<A> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn check_config(&self, config: &Value) -> Result<(), AdapterError> {
        let decoded = decode::<A::Config>(self.0.id(), config.clone())?;
        self.0.validate(&decoded)
    }

    async fn run_json(&self, config: Value) -> Result<Value, AdapterError> {
        let config = decode::<A::Config>(self.0.id(), config)?;
        let report = self.0.run(config).await?;
        Ok(serde_json::to_value(report)?)
    }
}

fn decode<T: DeserializeOwned>(adapter_id: &str, config: Value) -> Result<T, AdapterError> {
    serde_json::from_value(config).map_err(|e| {
        AdapterError::invalid(format!("config rejected by adapter '{}': {}", adapter_id, e))
    })
}
