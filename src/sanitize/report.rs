//! Sanitized per-metric reports and the views derived from them

use super::descriptions::describe;
use super::events::{MetricDefinition, MetricKind, PointData};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One observation attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Time string exactly as it appeared in the stream
    pub time: String,
    pub value: f64,
    pub tags: BTreeMap<String, String>,
    /// Epoch milliseconds, when `time` parses as RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl From<PointData> for Point {
    fn from(data: PointData) -> Self {
        let timestamp = DateTime::parse_from_rfc3339(&data.time)
            .ok()
            .map(|t| t.timestamp_millis());
        Self {
            time: data.time,
            value: data.value,
            tags: data.tags,
            timestamp,
        }
    }
}

/// Aggregate over a report's point values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize `values`; `None` when there are none.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        (count > 0).then(|| Self {
            count,
            avg: sum / count as f64,
            min,
            max,
        })
    }
}

/// The materialized record for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Arrival order, never re-sorted
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl MetricReport {
    /// Empty report for a declared metric.
    pub fn from_definition(definition: &MetricDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            kind: definition.kind,
            description: describe(&definition.name).into_owned(),
            unit: definition.contains.unit().map(str::to_string),
            points: Vec::new(),
            summary: None,
        }
    }

    /// Empty report for a metric that was never declared.
    pub fn implicit(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MetricKind::Unknown,
            description: describe(name).into_owned(),
            unit: None,
            points: Vec::new(),
            summary: None,
        }
    }

    /// Value of the most recently appended point.
    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    pub(crate) fn summarize(&mut self) {
        self.summary = Summary::of(self.points.iter().map(|p| p.value));
    }
}

/// A report without its point series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOverview {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub points: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl From<&MetricReport> for MetricOverview {
    fn from(report: &MetricReport) -> Self {
        Self {
            kind: report.kind,
            description: report.description.clone(),
            unit: report.unit.clone(),
            points: report.points.len(),
            summary: report.summary,
        }
    }
}

/// Terse per-metric view: unit, latest value, summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDigest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl From<&MetricReport> for MetricDigest {
    fn from(report: &MetricReport) -> Self {
        Self {
            unit: report.unit.clone(),
            value: report.last_value(),
            summary: report.summary,
        }
    }
}

/// What the stream-backed adapters hand back to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedRun {
    pub metrics: Vec<MetricReport>,
    pub digest: BTreeMap<String, MetricDigest>,
}

impl SanitizedRun {
    pub fn metric(&self, name: &str) -> Option<&MetricReport> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Ordered report set with a name index.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReportSet {
    reports: Vec<MetricReport>,
    index: HashMap<String, usize>,
}

impl ReportSet {
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Insert unless `name` is already present. Returns whether it was inserted.
    pub fn insert_new(&mut self, report: MetricReport) -> bool {
        if self.index.contains_key(&report.name) {
            return false;
        }
        self.index.insert(report.name.clone(), self.reports.len());
        self.reports.push(report);
        true
    }

    pub fn get(&self, name: &str) -> Option<&MetricReport> {
        self.index.get(name).map(|&i| &self.reports[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MetricReport> {
        self.index.get(name).map(|&i| &mut self.reports[i])
    }

    pub fn as_slice(&self) -> &[MetricReport] {
        &self.reports
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MetricReport> {
        self.reports.iter_mut()
    }

    pub fn into_vec(self) -> Vec<MetricReport> {
        self.reports
    }
}
