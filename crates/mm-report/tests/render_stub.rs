//! End-to-end render tests against stub backends.
//!
//! A `tiny_http` stub stands in for Prometheus/Loki; templates live in a
//! tempdir. These exercise the full namespace: globals, query functions,
//! and filters, plus error propagation out of the template engine.

use chrono::{TimeZone, Utc};
use mm_config::{BackendSettings, Settings};
use mm_query::TimeWindow;
use mm_report::{Renderer, ReportContext, ReportError};
use serde_json::{json, Value};
use std::io::Write;
use std::thread;

fn spawn_stub(body: Value) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub server");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("stub server has an IP address");
    let payload = body.to_string();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let _ = request.respond(tiny_http::Response::from_string(payload.clone()));
        }
    });
    format!("http://{addr}")
}

fn vector_body(samples: &[(Value, &str)]) -> Value {
    let result: Vec<Value> = samples
        .iter()
        .map(|(labels, value)| json!({ "metric": labels, "value": [1700000000.0, value] }))
        .collect();
    json!({ "status": "success", "data": { "resultType": "vector", "result": result } })
}

fn backend(url: String) -> BackendSettings {
    BackendSettings { url, auth: None }
}

fn unreachable() -> BackendSettings {
    backend("http://127.0.0.1:9".to_string())
}

fn settings(prometheus: BackendSettings, loki: BackendSettings) -> Settings {
    Settings {
        prometheus,
        loki,
        smtp: None,
    }
}

fn renderer(settings: &Settings) -> Renderer {
    let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
    let window = TimeWindow::resolve("7d", now).unwrap();
    Renderer::new(ReportContext::new(settings, window))
}

fn write_template(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join("report.html.jinja");
    let mut file = std::fs::File::create(&path).expect("create template");
    file.write_all(contents.as_bytes()).expect("write template");
    (dir, path)
}

#[test]
fn renders_scalar_query_and_globals() {
    let prom = spawn_stub(vector_body(&[(json!({"job": "node"}), "42")]));
    let settings = settings(backend(prom), unreachable());
    let renderer = renderer(&settings);

    let (_dir, path) = write_template(
        "<h1>Report {{ date }} ({{ time_selection }})</h1>\
         <p>{{ start_date }} to {{ end_date }}</p>\
         <p>up = {{ query_prom(\"up\") }}</p>",
    );
    let html = renderer.render_file(&path).unwrap();

    assert!(html.contains("Report 2026-03-14 (7d)"));
    assert!(html.contains("2026-03-07 12:00:00 to 2026-03-14 12:00:00"));
    assert!(html.contains("up = 42.0"));
}

#[test]
fn filters_apply_to_query_results() {
    let prom = spawn_stub(vector_body(&[(json!({}), "1536")]));
    let settings = settings(backend(prom), unreachable());
    let renderer = renderer(&settings);

    let (_dir, path) = write_template(
        "{{ query_prom(\"node_memory_MemTotal_bytes\") | fmt_bytes }} / \
         {{ 12.5 | fmt_pct }} / \
         {{ 3700 | to_timedelta | fmt_timedelta }} / \
         {{ 1700000000 | from_epoch }}",
    );
    let html = renderer.render_file(&path).unwrap();

    assert!(html.contains("1.50 KB"));
    assert!(html.contains("12.50%"));
    assert!(html.contains("1h 1m"));
    assert!(html.contains("2023-11-14 22:13:20"));
}

#[test]
fn loki_results_are_iterable_and_escaped() {
    let loki = spawn_stub(vector_body(&[(
        json!({"message": "<script>alert(1)</script>"}),
        "7",
    )]));
    let settings = settings(unreachable(), backend(loki));
    let renderer = renderer(&settings);

    let (_dir, path) = write_template(
        "{% for entry in query_loki('{job=\"syslog\"}') %}\
         <li>{{ entry.message }}: {{ entry.count }}</li>\
         {% endfor %}",
    );
    let html = renderer.render_file(&path).unwrap();

    // Auto-escaping must neutralize label values.
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains(": 7"));
}

#[test]
fn loki_top_uses_default_limit() {
    let loki = spawn_stub(vector_body(&[(json!({"country": "DE"}), "3")]));
    let settings = settings(unreachable(), backend(loki));
    let renderer = renderer(&settings);

    let (_dir, path) = write_template(
        "{% for entry in query_loki_top('{job=\"traefik\"}', 'country') %}\
         {{ entry.label_value }}={{ entry.count }} {% endfor %}",
    );
    let html = renderer.render_file(&path).unwrap();
    assert!(html.contains("DE=3"));
}

#[test]
fn adapter_failure_aborts_render() {
    let settings = settings(unreachable(), unreachable());
    let renderer = renderer(&settings);

    let (_dir, path) = write_template("{{ query_loki('{job=\"syslog\"}') }}");
    let err = renderer.render_file(&path).unwrap_err();

    let ReportError::Render(render_err) = err else {
        panic!("expected Render error, got {err:?}");
    };
    // The adapter failure must survive in the source chain.
    let mut source: Option<&dyn std::error::Error> = std::error::Error::source(&render_err);
    let mut found = false;
    while let Some(err) = source {
        if err.to_string().contains("log query failed") {
            found = true;
            break;
        }
        source = err.source();
    }
    assert!(found, "source chain should carry the log query error");
}

#[test]
fn missing_template_is_not_found() {
    let settings = settings(unreachable(), unreachable());
    let renderer = renderer(&settings);

    let err = renderer
        .render_file(std::path::Path::new("/nonexistent/weekly.html.jinja"))
        .unwrap_err();
    assert!(matches!(err, ReportError::TemplateNotFound { .. }));
}

#[test]
fn template_syntax_error_is_render_error() {
    let settings = settings(unreachable(), unreachable());
    let renderer = renderer(&settings);

    let (_dir, path) = write_template("{% for x in %}");
    assert!(matches!(
        renderer.render_file(&path),
        Err(ReportError::Render(_))
    ));
}

#[test]
fn subject_renders_date_without_queries() {
    let settings = settings(unreachable(), unreachable());
    let renderer = renderer(&settings);

    let subject = renderer
        .render_subject("Weekly Infrastructure Report - {{ date }}")
        .unwrap();
    assert_eq!(subject, "Weekly Infrastructure Report - 2026-03-14");
}

#[test]
fn subject_has_no_query_functions() {
    let settings = settings(unreachable(), unreachable());
    let renderer = renderer(&settings);

    assert!(renderer.render_subject("{{ query_prom(\"up\") }}").is_err());
}
