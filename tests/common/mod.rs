//! Shared fixtures for integration tests
//!
//! A small but realistic event stream, and helpers that put it on disk or
//! behind a stand-in for the load-generator binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Event stream of a two-request run: declared metrics interleaved with
/// points, one duplicate definition and one undeclared metric.
pub const SAMPLE_STREAM: &str = r#"{"type":"Metric","data":{"name":"vus","type":"gauge","contains":"default","thresholds":[],"submetrics":null},"metric":"vus"}
{"type":"Point","data":{"time":"2024-03-01T12:00:00Z","value":1,"tags":null},"metric":"vus"}
{"type":"Metric","data":{"name":"http_reqs","type":"counter","contains":"default","thresholds":[],"submetrics":null},"metric":"http_reqs"}
{"type":"Metric","data":{"name":"http_req_duration","type":"trend","contains":"time","thresholds":["p(95)<500"],"submetrics":null},"metric":"http_req_duration"}
{"type":"Point","data":{"time":"2024-03-01T12:00:00.250Z","value":1,"tags":{"method":"GET","status":"200","scenario":"default"}},"metric":"http_reqs"}
{"type":"Point","data":{"time":"2024-03-01T12:00:00.250Z","value":120.5,"tags":{"method":"GET","status":"200","scenario":"default"}},"metric":"http_req_duration"}
{"type":"Point","data":{"time":"2024-03-01T12:00:01Z","value":2,"tags":null},"metric":"vus"}
{"type":"Metric","data":{"name":"vus","type":"counter","contains":"data","thresholds":[],"submetrics":null},"metric":"vus"}
{"type":"Point","data":{"time":"2024-03-01T12:00:01.100Z","value":1,"tags":{"method":"POST","status":"201","scenario":"default"}},"metric":"http_reqs"}
{"type":"Point","data":{"time":"2024-03-01T12:00:01.100Z","value":79.5,"tags":{"method":"POST","status":"201","scenario":"default"}},"metric":"http_req_duration"}
{"type":"Point","data":{"time":"2024-03-01T12:00:01.200Z","value":3,"tags":{"scenario":"default"}},"metric":"custom_counter"}
{"type":"Metric","data":{"name":"data_sent","type":"counter","contains":"data","thresholds":[],"submetrics":null},"metric":"data_sent"}
"#;

/// Write `contents` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}

/// A shell script that behaves like `k6 run --out json=PATH ...` by
/// writing [`SAMPLE_STREAM`] to PATH.
#[cfg(unix)]
pub fn fake_k6(dir: &Path) -> PathBuf {
    let script = format!(
        "#!/bin/sh\nout=\"\"\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    json=*) out=\"${{arg#json=}}\" ;;\n  esac\ndone\n[ -n \"$out\" ] || {{ echo \"no output path\" >&2; exit 2; }}\ncat > \"$out\" <<'EOF'\n{}EOF\n",
        SAMPLE_STREAM
    );
    executable(dir, "fake-k6", &script)
}

/// A stand-in binary that fails with a message on stderr.
#[cfg(unix)]
pub fn failing_k6(dir: &Path) -> PathBuf {
    executable(dir, "failing-k6", "#!/bin/sh\necho \"script error: boom\" >&2\nexit 99\n")
}

#[cfg(unix)]
fn executable(dir: &Path, name: &str, contents: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = write_file(dir, name, contents);
    let mut permissions = std::fs::metadata(&path)
        .expect("fixture metadata")
        .permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("failed to mark fixture executable");
    path
}
