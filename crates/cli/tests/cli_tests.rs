//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the built binary with an isolated home so no user config leaks in
fn rent(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rent"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RENT_API_URL")
        .env_remove("RENT_MODEL_PATH")
        .output()
        .expect("Failed to execute command")
}

/// Linear artifact whose score is a constant
fn write_artifact(dir: &Path, intercept: f64) -> String {
    let features: Vec<String> = rent_lib::predictor::feature_names()
        .map(str::to_string)
        .collect();
    let manifest = serde_json::json!({
        "name": "ucc_hostel_rent_predictor",
        "version": "cli-test",
        "features": features,
        "model": { "kind": "linear", "intercept": intercept }
    });
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();
    path.display().to_string()
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = rent(home.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Hostel Rent Predictor"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("schema"), "Should show schema command");
    assert!(stdout.contains("sample"), "Should show sample command");
    assert!(stdout.contains("status"), "Should show status command");
}

#[test]
fn test_predict_help_lists_form_fields() {
    let home = TempDir::new().unwrap();
    let output = rent(home.path(), &["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in ["--deposit", "--hostel-location", "--janitorial-services", "--model"] {
        assert!(stdout.contains(flag), "Should show {}", flag);
    }
}

#[test]
fn test_predict_with_local_model() {
    let home = TempDir::new().unwrap();
    let model = write_artifact(home.path(), std::f64::consts::LN_2);
    let output = rent(home.path(), &["predict", "--model", &model, "--wifi"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Predicted Annual Rent: GHS 1.00"), "stdout: {}", stdout);
}

#[test]
fn test_predict_json_output() {
    let home = TempDir::new().unwrap();
    let model = write_artifact(home.path(), 0.0);
    let output = rent(home.path(), &["--format", "json", "predict", "--model", &model]);

    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["display"], "Predicted Annual Rent: GHS 0.00");
    assert_eq!(body["model_version"], "cli-test");
}

#[test]
fn test_predict_fails_fast_on_missing_artifact() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("absent.json").display().to_string();
    let output = rent(home.path(), &["predict", "--model", &missing]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Cannot load model artifact"), "stderr: {}", stderr);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Predicted Annual Rent"));
}

#[test]
fn test_predict_rejects_unknown_label() {
    let home = TempDir::new().unwrap();
    let model = write_artifact(home.path(), 0.0);
    let output = rent(home.path(), &["predict", "--model", &model, "--hostel-location", "Accra"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("hostel_location"));
}

#[test]
fn test_predict_against_server() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1/predict")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"annual_rent":5400.0,"currency":"GHS","display":"Predicted Annual Rent: GHS 5400.00","model_version":"2024.1"}"#,
        )
        .create();

    let home = TempDir::new().unwrap();
    let url = server.url();
    let output = rent(home.path(), &["--api-url", &url, "predict"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("GHS 5400.00"));
    mock.assert();
}

#[test]
fn test_schema_lists_all_features() {
    let home = TempDir::new().unwrap();
    let output = rent(home.path(), &["--format", "json", "schema"]);

    assert!(output.status.success());
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.len(), rent_lib::predictor::FEATURE_COUNT);
    assert!(rows.iter().any(|r| r["name"] == "log_deposit" && r["kind"] == "derived"));
}

#[test]
fn test_sample_shows_derived_features() {
    let home = TempDir::new().unwrap();
    let output = rent(home.path(), &["--format", "json", "sample"]);

    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["inputs"]["avg_area_rent"], 4000.0);
    let log_avg = body["features"]["log_avg_area_rent"].as_f64().unwrap();
    assert!((log_avg - 4000.0_f64.ln_1p()).abs() < 1e-9);
}
