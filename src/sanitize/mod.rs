//! Metric sanitization
//!
//! Turns the raw event stream of a load-generation run into one report per
//! metric, with the point series and a summary.
//!
//! Processing is eager and runs in two passes over the input:
//! 1. Definitions: one report skeleton per metric name, first definition wins
//! 2. Points: appended to their metric's report in arrival order; a point for
//!    an undeclared metric creates an `unknown` report on the spot
//!
//! A final pass computes summaries for every report that received points.
//! After construction the sanitizer only answers queries.

mod descriptions;
mod events;
mod report;

pub use descriptions::describe;
pub use events::{MetricDefinition, MetricKind, PointData, RawEvent, ValueCategory};
pub use report::{MetricDigest, MetricOverview, MetricReport, Point, SanitizedRun, Summary};

use report::ReportSet;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;

/// Errors from reading an event stream.
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("failed to parse event stream at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("event stream contains no events")]
    EmptyStream,

    #[error("failed to read event stream: {0}")]
    Io(#[from] std::io::Error),
}

pub type SanitizeResult<T> = Result<T, SanitizeError>;

/// Processed, read-only view over one event stream.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    reports: ReportSet,
}

impl Sanitizer {
    /// Sanitize an already-decoded event sequence.
    pub fn new(events: Vec<RawEvent>) -> Self {
        let mut reports = ReportSet::default();

        for event in &events {
            if let RawEvent::Metric { data, .. } = event {
                reports.insert_new(MetricReport::from_definition(data));
            }
        }

        for event in events {
            if let RawEvent::Point { metric, data } = event {
                if !reports.contains(&metric) {
                    reports.insert_new(MetricReport::implicit(&metric));
                }
                if let Some(report) = reports.get_mut(&metric) {
                    report.points.push(Point::from(data));
                }
            }
        }

        for report in reports.iter_mut() {
            report.summarize();
        }

        Self { reports }
    }

    /// Parse newline-delimited JSON and sanitize it.
    ///
    /// Blank lines are skipped. The first undecodable line aborts with its
    /// 1-based line number.
    pub fn from_ndjson(input: &str) -> SanitizeResult<Self> {
        let mut events = Vec::new();
        for (i, line) in input.lines().enumerate() {
            push_line(&mut events, i + 1, line)?;
        }
        Self::from_events(events)
    }

    /// Like [`Sanitizer::from_ndjson`], reading line by line.
    pub fn from_reader(reader: impl BufRead) -> SanitizeResult<Self> {
        let mut events = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            push_line(&mut events, i + 1, &line?)?;
        }
        Self::from_events(events)
    }

    /// Read and sanitize an event stream file.
    pub fn from_path(path: impl AsRef<Path>) -> SanitizeResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_events(events: Vec<RawEvent>) -> SanitizeResult<Self> {
        if events.is_empty() {
            return Err(SanitizeError::EmptyStream);
        }
        Ok(Self::new(events))
    }

    /// All reports: declared metrics in definition order, then undeclared
    /// ones in order of their first point.
    pub fn reports(&self) -> &[MetricReport] {
        self.reports.as_slice()
    }

    pub fn get(&self, name: &str) -> Option<&MetricReport> {
        self.reports.get(name)
    }

    pub fn by_kind(&self, kind: MetricKind) -> Vec<&MetricReport> {
        self.reports().iter().filter(|r| r.kind == kind).collect()
    }

    /// Per-metric overview without point series.
    pub fn summaries(&self) -> BTreeMap<String, MetricOverview> {
        self.reports()
            .iter()
            .map(|r| (r.name.clone(), MetricOverview::from(r)))
            .collect()
    }

    /// Per-metric unit, latest value and summary.
    pub fn digest(&self) -> BTreeMap<String, MetricDigest> {
        self.reports()
            .iter()
            .map(|r| (r.name.clone(), MetricDigest::from(r)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports().is_empty()
    }

    pub fn into_reports(self) -> Vec<MetricReport> {
        self.reports.into_vec()
    }

    /// Reports plus digest, in the shape adapters return.
    pub fn into_run(self) -> SanitizedRun {
        let digest = self.digest();
        SanitizedRun {
            metrics: self.into_reports(),
            digest,
        }
    }
}

fn push_line(events: &mut Vec<RawEvent>, line: usize, text: &str) -> SanitizeResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let event = serde_json::from_str(text).map_err(|source| SanitizeError::Parse { line, source })?;
    events.push(event);
    Ok(())
}
