use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for a single [`super::Pipeline::run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Start all enabled adapters together instead of one after another
    #[serde(alias = "runInParallel")]
    pub run_in_parallel: bool,

    /// Milliseconds. Reserved: accepted, not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Reserved: accepted, not enforced.
    #[serde(alias = "saveRaw")]
    pub save_raw: bool,
}

impl RunOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn parallel() -> Self {
        Self {
            run_in_parallel: true,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_save_raw(mut self, save_raw: bool) -> Self {
        self.save_raw = save_raw;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_camel_case_keys() {
        let options: RunOptions =
            serde_json::from_value(json!({"runInParallel": true, "timeout": 1500, "saveRaw": true}))
                .unwrap();

        assert!(options.run_in_parallel);
        assert!(options.save_raw);
        assert_eq!(options.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn oversized_timeout_saturates() {
        let options = RunOptions::sequential().with_timeout(Duration::MAX);
        assert_eq!(options.timeout, Some(u64::MAX));

        let options = RunOptions::sequential().with_timeout(Duration::from_secs(2));
        assert_eq!(options.timeout, Some(2000));
    }

    #[test]
    fn missing_fields_default_to_sequential() {
        let options: RunOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, RunOptions::sequential());
    }
}
