mod common;

use common::{fixture, run_cli};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn extract_reads_file_and_prints_document() {
    let dir = TempDir::new().expect("create temp dir");
    let input = dir.path().join("reply.txt");
    fs::write(&input, fixture("fenced_reply.txt")).expect("write input");

    let run = run_cli(&["extract", "--input", input.to_str().unwrap()], None);
    assert!(run.success, "stderr: {}", run.stderr);
    let doc = run.json();
    assert_eq!(doc["designName"], json!("不对称垂褶连衣裙"));
    assert_eq!(doc["difficulty"], json!(4));
    assert_eq!(doc["steps"].as_array().unwrap().len(), 5);
    assert_eq!(doc["tools"][0]["name"], json!("珠针"));
}

#[test]
fn extract_reads_stdin_and_reports_tier() {
    let run = run_cli(
        &["extract", "--input", "-", "--report"],
        Some(&fixture("broken_structure.txt")),
    );
    assert!(run.success, "stderr: {}", run.stderr);
    let report = run.json();
    assert_eq!(report["tier"], json!("salvage"));
    assert_eq!(report["salvaged"], json!(true));
    assert_eq!(report["document"]["designName"], json!("披肩"));
    assert_eq!(report["document"]["steps"][1]["title"], json!("固定"));
}

#[test]
fn extract_failure_prints_reply_and_exits_nonzero() {
    let run = run_cli(&["extract"], Some(&fixture("prose_only.txt")));
    assert!(!run.success);
    let body = run.json();
    assert_eq!(body["code"], json!("no_json_object_found"));
    assert_eq!(body["retry"], json!(true));
}

#[test]
fn extract_missing_steps_is_reported() {
    let run = run_cli(&["extract"], Some(r#"{"designName":"A","steps":[]}"#));
    assert!(!run.success);
    assert_eq!(run.json()["code"], json!("missing_steps"));
}

#[test]
fn tables_round_trip_through_override() {
    let run = run_cli(&["tables"], None);
    assert!(run.success, "stderr: {}", run.stderr);
    let mut tables: Value = run.json();
    tables["default_design_name"] = json!("无名之作");

    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("tables.json");
    fs::write(&path, serde_json::to_string(&tables).unwrap()).expect("write tables");

    let run = run_cli(
        &["extract", "--tables", path.to_str().unwrap()],
        Some(r#"{"steps":[{"title":"Pin"}]}"#),
    );
    assert!(run.success, "stderr: {}", run.stderr);
    assert_eq!(run.json()["designName"], json!("无名之作"));
}

#[test]
fn invalid_tables_are_rejected() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("tables.json");
    fs::write(&path, r#"{"unknown_field": true}"#).expect("write tables");

    let run = run_cli(
        &["extract", "--tables", path.to_str().unwrap()],
        Some(r#"{"steps":[{"title":"Pin"}]}"#),
    );
    assert!(!run.success);
    assert!(run.stderr.contains("tables"), "stderr: {}", run.stderr);
}

#[test]
fn analyze_without_credential_reports_server_error() {
    let dir = TempDir::new().expect("create temp dir");
    let image = dir.path().join("dress.png");
    fs::write(&image, b"not really a png").expect("write image");

    let run = run_cli(
        &["analyze", "--image", image.to_str().unwrap(), "--envelope"],
        None,
    );
    assert!(!run.success);
    let envelope = run.json();
    assert_eq!(envelope["status"], json!(500));
    assert_eq!(
        envelope["headers"]["Access-Control-Allow-Origin"],
        json!("*")
    );
    assert!(envelope["body"]["error"]
        .as_str()
        .unwrap()
        .contains("ANTHROPIC_API_KEY"));
}
