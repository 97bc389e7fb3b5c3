//! Raw events of a load-generation run's JSON output
//!
//! One JSON object per line. Two kinds matter:
//! - `Metric`: declares a metric (name, kind, value category)
//! - `Point`: one timestamped, tagged observation of a named metric

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a metric as declared by its definition event.
///
/// Points that reference an undeclared metric produce reports of kind
/// [`MetricKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MetricKind {
    Gauge,
    Counter,
    Trend,
    Rate,
    Unknown,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
            Self::Trend => "trend",
            Self::Rate => "rate",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for MetricKind {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(Self::Gauge),
            "counter" => Ok(Self::Counter),
            "trend" => Ok(Self::Trend),
            "rate" => Ok(Self::Rate),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown metric kind '{}'", other)),
        }
    }
}

/// Value category of a metric, used to infer its display unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ValueCategory {
    #[default]
    Default,
    Time,
    Data,
}

impl From<String> for ValueCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "time" => Self::Time,
            "data" => Self::Data,
            _ => Self::Default,
        }
    }
}

impl ValueCategory {
    /// Display unit implied by the category.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Time => Some("ms"),
            Self::Data => Some("bytes"),
            Self::Default => None,
        }
    }
}

/// Payload of a `Metric` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default, deserialize_with = "nullable")]
    pub contains: ValueCategory,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub submetrics: Vec<serde_json::Value>,
}

impl MetricDefinition {
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
            contains: ValueCategory::Default,
            thresholds: Vec::new(),
            submetrics: Vec::new(),
        }
    }

    pub fn with_contains(mut self, contains: ValueCategory) -> Self {
        self.contains = contains;
        self
    }
}

/// Payload of a `Point` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    pub time: String,
    pub value: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: BTreeMap<String, String>,
}

// The generator writes `null` for empty tag sets, thresholds and submetrics.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One line of the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawEvent {
    Metric {
        metric: String,
        data: MetricDefinition,
    },
    Point {
        metric: String,
        data: PointData,
    },
    /// Any other event type; carried through parsing and then ignored.
    #[serde(other)]
    Other,
}

impl RawEvent {
    pub fn definition(definition: MetricDefinition) -> Self {
        Self::Metric {
            metric: definition.name.clone(),
            data: definition,
        }
    }

    pub fn point(metric: impl Into<String>, time: impl Into<String>, value: f64) -> Self {
        Self::Point {
            metric: metric.into(),
            data: PointData {
                time: time.into(),
                value,
                tags: BTreeMap::new(),
            },
        }
    }

    pub fn tagged_point(
        metric: impl Into<String>,
        time: impl Into<String>,
        value: f64,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self::Point {
            metric: metric.into(),
            data: PointData {
                time: time.into(),
                value,
                tags,
            },
        }
    }
}
