//! CLI integration tests

use std::process::Command;

fn anomaly() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_anomaly"));
    cmd.env("NO_COLOR", "1")
        .env_remove("ANOMALY_BASELINE_DAYS")
        .env_remove("ANOMALY_SPIKE_RATIO")
        .env_remove("ANOMALY_DROP_RATIO")
        .env_remove("ANOMALY_EVENT_NAME");
    cmd
}

fn write_observations(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("observations.json");
    std::fs::write(
        &path,
        r#"[
            {"tenant_id": "t1", "day": "2024-01-01", "value": 10},
            {"tenant_id": "t1", "day": "2024-01-02", "value": 10},
            {"tenant_id": "t1", "day": "2024-01-03", "value": 10},
            {"tenant_id": "t1", "day": "2024-01-04", "value": 50},
            {"tenant_id": "t2", "day": "2024-01-04", "value": 2},
            {"tenant_id": "t2", "day": "2024-01-01", "value": 20},
            {"tenant_id": "t2", "day": "2024-01-03", "value": 20},
            {"tenant_id": "t2", "day": "2024-01-02", "value": 20}
        ]"#,
    )
    .unwrap();
    path
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = anomaly().arg("--help").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Tenant Anomaly Detector"), "Should show app name");
    assert!(stdout.contains("detect"), "Should show detect command");
    assert!(stdout.contains("severity"), "Should show severity command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = anomaly().arg("--version").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("anomaly"), "Should show binary name");
}

#[test]
fn test_detect_json_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = write_observations(dir.path());

    let output = anomaly()
        .args(["detect", "--baseline-days", "3", "--format", "json", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "detect should succeed");

    let anomalies: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let anomalies = anomalies.as_array().unwrap();
    assert_eq!(anomalies.len(), 2);

    assert_eq!(anomalies[0]["tenant_id"], "t1");
    assert_eq!(anomalies[0]["baseline"], 10.0);
    assert_eq!(anomalies[0]["ratio"], 5.0);
    assert_eq!(anomalies[0]["direction"], "spike");
    assert_eq!(anomalies[0]["severity"], "high");
    assert_eq!(anomalies[0]["details"]["event_name"], "order.completed");

    assert_eq!(anomalies[1]["tenant_id"], "t2");
    assert_eq!(anomalies[1]["day"], "2024-01-04");
    assert_eq!(anomalies[1]["direction"], "drop");
    assert_eq!(anomalies[1]["severity"], "high");
}

#[test]
fn test_detect_table_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = write_observations(dir.path());

    let output = anomaly()
        .args(["detect", "--baseline-days", "3", "--tenant", "t1", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Tenant"));
    assert!(stdout.contains("5.00x"));
    assert!(!stdout.contains("t2"));
}

#[test]
fn test_detect_rejects_zero_baseline_days() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = write_observations(dir.path());

    let output = anomaly()
        .args(["detect", "--baseline-days", "0", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("baseline_days"));
}

#[test]
fn test_detect_missing_input_fails() {
    let output = anomaly()
        .args(["detect", "--input", "/nonexistent/observations.json"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_severity_command() {
    let output = anomaly()
        .args(["severity", "0.3", "--direction", "drop", "--format", "json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["severity"], "medium");
    assert_eq!(report["direction"], "drop");
}
