//! What a pipeline run hands back

use super::PipelineError;
use crate::adapter::AdapterError;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Reports keyed by adapter, in registration order.
///
/// Skipped adapters map to `None` and serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineResult {
    entries: Vec<(String, Option<Value>)>,
}

impl PipelineResult {
    pub(crate) fn new(entries: Vec<(String, Option<Value>)>) -> Self {
        Self { entries }
    }

    /// Report of `key`; `None` when skipped or not registered.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).and_then(Option::as_ref)
    }

    /// Decode the report of `key` into its concrete type.
    pub fn report<R: DeserializeOwned>(&self, key: &str) -> Result<Option<R>, serde_json::Error> {
        self.get(key).cloned().map(serde_json::from_value).transpose()
    }

    pub fn is_skipped(&self, key: &str) -> bool {
        matches!(self.entry(key), Some(None))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, key: &str) -> Option<&Option<Value>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl Serialize for PipelineResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// How one adapter fared in a collect-all run.
#[derive(Debug)]
pub enum AdapterOutcome {
    Completed(Value),
    Skipped,
    Failed(AdapterError),
}

impl AdapterOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn report(&self) -> Option<&Value> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// `{"status": "completed", "report": ..}`, `{"status": "skipped"}` or
/// `{"status": "failed", "error": ".."}`.
impl Serialize for AdapterOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Completed(report) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "completed")?;
                map.serialize_entry("report", report)?;
                map.end()
            }
            Self::Skipped => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", "skipped")?;
                map.end()
            }
            Self::Failed(e) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "failed")?;
                map.serialize_entry("error", &e.to_string())?;
                map.end()
            }
        }
    }
}

/// Per-adapter outcomes of a collect-all run, in registration order.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    entries: Vec<(String, AdapterOutcome)>,
}

impl PipelineOutcome {
    pub(crate) fn new(entries: Vec<(String, AdapterOutcome)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&AdapterOutcome> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AdapterOutcome)> {
        self.entries.iter().map(|(k, o)| (k.as_str(), o))
    }

    pub fn failures(&self) -> Vec<(&str, &AdapterError)> {
        self.entries
            .iter()
            .filter_map(|(k, o)| match o {
                AdapterOutcome::Failed(e) => Some((k.as_str(), e)),
                _ => None,
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        !self.entries.iter().any(|(_, o)| o.is_failed())
    }

    /// Collapse into the fail-fast shape: the first failure in registration
    /// order wins.
    pub fn into_result(self) -> Result<PipelineResult, PipelineError> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (key, outcome) in self.entries {
            match outcome {
                AdapterOutcome::Completed(value) => entries.push((key, Some(value))),
                AdapterOutcome::Skipped => entries.push((key, None)),
                AdapterOutcome::Failed(source) => {
                    return Err(PipelineError::AdapterFailed { key, source })
                }
            }
        }
        Ok(PipelineResult::new(entries))
    }
}

impl Serialize for PipelineOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, outcome) in &self.entries {
            map.serialize_entry(key, outcome)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_registration_order_with_nulls() {
        let result = PipelineResult::new(vec![
            ("zeta".to_string(), Some(json!(1))),
            ("alpha".to_string(), None),
        ]);

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"zeta":1,"alpha":null}"#
        );
    }

    #[test]
    fn skipped_and_missing_are_distinguishable() {
        let result = PipelineResult::new(vec![("a".to_string(), None)]);

        assert!(result.get("a").is_none());
        assert!(result.is_skipped("a"));
        assert!(result.contains_key("a"));
        assert!(!result.is_skipped("b"));
        assert!(!result.contains_key("b"));
    }

    #[test]
    fn typed_report_decode() {
        let result = PipelineResult::new(vec![("n".to_string(), Some(json!(7)))]);
        assert_eq!(result.report::<u32>("n").unwrap(), Some(7));
        assert_eq!(result.report::<u32>("missing").unwrap(), None);
        assert!(result.report::<String>("n").is_err());
    }

    #[test]
    fn outcome_serializes_in_registration_order() {
        let outcome = PipelineOutcome::new(vec![
            ("zeta".to_string(), AdapterOutcome::Completed(json!(1))),
            ("mid".to_string(), AdapterOutcome::Skipped),
            ("alpha".to_string(), AdapterOutcome::Failed(AdapterError::Execution("boom".into()))),
        ]);

        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            concat!(
                r#"{"zeta":{"status":"completed","report":1},"#,
                r#""mid":{"status":"skipped"},"#,
                r#""alpha":{"status":"failed","error":"execution failed: boom"}}"#
            )
        );
    }

    #[test]
    fn outcome_into_result_picks_first_failure() {
        let outcome = PipelineOutcome::new(vec![
            ("ok".to_string(), AdapterOutcome::Completed(json!(1))),
            ("first".to_string(), AdapterOutcome::Failed(AdapterError::Execution("a".into()))),
            ("second".to_string(), AdapterOutcome::Failed(AdapterError::Execution("b".into()))),
        ]);

        assert!(!outcome.is_success());
        assert_eq!(outcome.failures().len(), 2);

        match outcome.into_result().unwrap_err() {
            PipelineError::AdapterFailed { key, .. } => assert_eq!(key, "first"),
            other => panic!("expected adapter failure, got {:?}", other),
        }
    }
}
