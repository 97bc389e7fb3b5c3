//! Pipelines built from the stock adapters, run end to end

mod common;

use common::{write_file, SAMPLE_STREAM};
use loadpipe::config::PipelineFile;
use loadpipe::{
    Pipeline, PipelineError, RunOptions, SanitizedRun, StreamAdapter, StreamConfig,
};
use serde_json::json;

#[tokio::test]
async fn stream_adapter_report_round_trips_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let events = write_file(dir.path(), "events.json", SAMPLE_STREAM);

    let pipeline = Pipeline::new()
        .add_adapter("baseline", StreamAdapter::new(), Some(StreamConfig::new(&events)))
        .unwrap();

    let result = pipeline.run(None, &RunOptions::sequential()).await.unwrap();
    let run: SanitizedRun = result.report("baseline").unwrap().unwrap();

    assert_eq!(run.metrics.len(), 5);
    assert_eq!(run.digest["vus"].value, Some(2.0));
    assert_eq!(run.metric("http_req_duration").unwrap().points.len(), 2);
}

#[tokio::test]
async fn override_points_adapter_at_another_stream() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_file(dir.path(), "first.json", SAMPLE_STREAM);
    let second = write_file(
        dir.path(),
        "second.json",
        r#"{"type":"Point","metric":"only","data":{"time":"2024-03-01T12:00:00Z","value":42,"tags":null}}"#,
    );

    let pipeline = Pipeline::new()
        .add_adapter("s", StreamAdapter::new(), Some(StreamConfig::new(&first)))
        .unwrap();

    let overrides = json!({"s": {"path": second}});
    let result = pipeline
        .run(Some(&overrides), &RunOptions::parallel())
        .await
        .unwrap();

    let run: SanitizedRun = result.report("s").unwrap().unwrap();
    assert_eq!(run.metrics.len(), 1);
    assert_eq!(run.digest["only"].value, Some(42.0));
}

#[tokio::test]
async fn broken_stream_fails_pipeline_with_key() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(dir.path(), "good.json", SAMPLE_STREAM);
    let bad = write_file(dir.path(), "bad.json", "{\"type\":\"Point\"\n");

    let pipeline = Pipeline::new()
        .add_adapter("good", StreamAdapter::new(), Some(StreamConfig::new(&good)))
        .unwrap()
        .add_adapter("bad", StreamAdapter::new(), Some(StreamConfig::new(&bad)))
        .unwrap();

    let err = pipeline.run(None, &RunOptions::sequential()).await.unwrap_err();
    assert!(matches!(err, PipelineError::AdapterFailed { ref key, .. } if key == "bad"));
    assert!(err.to_string().contains("line 1"));

    let outcome = pipeline
        .run_collect(None, &RunOptions::sequential())
        .await
        .unwrap();
    assert!(outcome.get("good").unwrap().report().is_some());
    assert!(outcome.get("bad").unwrap().is_failed());
}

#[tokio::test]
async fn empty_stream_path_is_rejected_at_registration() {
    let err = Pipeline::new()
        .add_adapter("s", StreamAdapter::new(), Some(StreamConfig::new("")))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig { ref key, .. } if key == "s"));
}

#[tokio::test]
async fn result_serializes_as_keyed_object() {
    let dir = tempfile::tempdir().unwrap();
    let events = write_file(dir.path(), "events.json", SAMPLE_STREAM);

    let pipeline = Pipeline::new()
        .add_adapter("z_first", StreamAdapter::new(), Some(StreamConfig::new(&events)))
        .unwrap()
        .add_adapter("a_disabled", StreamAdapter::new(), None)
        .unwrap();

    let result = pipeline.run(None, &RunOptions::sequential()).await.unwrap();
    let text = serde_json::to_string(&result).unwrap();

    assert!(text.starts_with(r#"{"z_first":{"#));
    assert!(text.ends_with(r#""a_disabled":null}"#));
}

#[tokio::test]
async fn pipeline_file_with_stream_adapter() {
    let dir = tempfile::tempdir().unwrap();
    let events = write_file(dir.path(), "events.json", SAMPLE_STREAM);
    let yaml = format!(
        "adapters:\n  - key: recorded\n    kind: stream\n    config:\n      path: {}\n  - key: live\n    kind: k6\n    config: null\n",
        events.display()
    );

    let file = PipelineFile::from_yaml_str(&yaml).unwrap();
    let result = file
        .build()
        .unwrap()
        .run(None, &file.options)
        .await
        .unwrap();

    assert!(result.get("recorded").is_some());
    assert!(result.is_skipped("live"));
}

#[cfg(unix)]
mod k6 {
    use super::common::{failing_k6, fake_k6, write_file, SAMPLE_STREAM};
    use loadpipe::{
        AdapterError, K6Adapter, K6Config, Pipeline, PipelineError, RunOptions, SanitizedRun,
        StreamAdapter, StreamConfig,
    };

    #[tokio::test]
    async fn k6_run_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_k6(dir.path());
        let script = write_file(dir.path(), "load.js", "export default function () {}\n");

        let config = K6Config::new(&script)
            .with_vus(2)
            .with_duration("1s")
            .with_binary(binary.to_string_lossy());

        let pipeline = Pipeline::new()
            .add_adapter("smoke", K6Adapter::new(), Some(config))
            .unwrap();
        let result = pipeline.run(None, &RunOptions::sequential()).await.unwrap();

        let run: SanitizedRun = result.report("smoke").unwrap().unwrap();
        assert_eq!(run.metrics.len(), 5);
        assert_eq!(run.digest["http_req_duration"].unit.as_deref(), Some("ms"));
    }

    #[tokio::test]
    async fn k6_and_stream_run_together() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_k6(dir.path());
        let events = write_file(dir.path(), "baseline.json", SAMPLE_STREAM);

        let pipeline = Pipeline::new()
            .add_adapter(
                "live",
                K6Adapter::new(),
                Some(K6Config::new("load.js").with_binary(binary.to_string_lossy())),
            )
            .unwrap()
            .add_adapter("baseline", StreamAdapter::new(), Some(StreamConfig::new(&events)))
            .unwrap();

        let result = pipeline.run(None, &RunOptions::parallel()).await.unwrap();

        let live: SanitizedRun = result.report("live").unwrap().unwrap();
        let baseline: SanitizedRun = result.report("baseline").unwrap().unwrap();
        assert_eq!(live, baseline);
    }

    #[tokio::test]
    async fn failing_k6_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let binary = failing_k6(dir.path());

        let pipeline = Pipeline::new()
            .add_adapter(
                "smoke",
                K6Adapter::new(),
                Some(K6Config::new("load.js").with_binary(binary.to_string_lossy())),
            )
            .unwrap();

        let err = pipeline.run(None, &RunOptions::sequential()).await.unwrap_err();
        match err {
            PipelineError::AdapterFailed { key, source } => {
                assert_eq!(key, "smoke");
                assert!(matches!(source, AdapterError::Execution(_)));
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("expected adapter failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_object_scenario_is_rejected_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let binary = failing_k6(dir.path());

        let pipeline = Pipeline::new()
            .add_adapter(
                "smoke",
                K6Adapter::new(),
                Some(K6Config::new("load.js").with_binary(binary.to_string_lossy())),
            )
            .unwrap();

        let overrides = serde_json::json!({"smoke": {"scenarios": {"ramp": 5}}});
        let err = pipeline
            .run(Some(&overrides), &RunOptions::sequential())
            .await
            .unwrap_err();

        match err {
            PipelineError::InvalidConfig { key, source } => {
                assert_eq!(key, "smoke");
                assert!(source.is_invalid_input());
                assert!(source.to_string().contains("scenario 'ramp'"));
            }
            other => panic!("expected invalid config, got {:?}", other),
        }
    }
}
