//! CLI integration tests

use spread_lib::{
    AnalysisOptions, ClusterSnapshot, ComparativeAnalysis, DistributionStatistics,
    ExperimentOutcome, MeasurementSet, ResultStore,
};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

fn spread(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spread"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

/// Write a small before/after record and return its path
fn write_record(dir: &Path) -> PathBuf {
    let before = MeasurementSet::new(
        ClusterSnapshot::new(5, 5).unwrap(),
        [DistributionStatistics::compute("test-a", [3, 1])],
        None,
    )
    .unwrap();
    let after = MeasurementSet::new(
        ClusterSnapshot::new(8, 8).unwrap(),
        [DistributionStatistics::compute("test-a", [1, 1, 1, 1])],
        None,
    )
    .unwrap();
    let analysis =
        ComparativeAnalysis::compute(Some(&before), &after, &AnalysisOptions::default()).unwrap();
    let outcome = ExperimentOutcome {
        label: "P1.ii".to_string(),
        analysis,
        measurements: vec![before, after],
        elapsed: Some(Duration::from_secs(42)),
    };
    let record = outcome.to_record("kind-bench", serde_json::json!({ "scenario": "P1.ii" }));

    ResultStore::new(dir)
        .write("P1.ii", "P1.ii", &record)
        .unwrap()
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = spread(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("run"), "Should show run command");
    assert!(stdout.contains("collect"), "Should show collect command");
    assert!(stdout.contains("scenarios"), "Should show scenarios command");
    assert!(stdout.contains("show"), "Should show show command");
    assert!(stdout.contains("--context"), "Should show context option");
    assert!(stdout.contains("--no-print"), "Should show no-print option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = spread(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("spread"), "Should show binary name");
}

/// Test run subcommand help
#[test]
fn test_run_help() {
    let output = spread(&["run", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Run help should succeed");
    assert!(stdout.contains("--namespace"), "Should show namespace option");
    assert!(stdout.contains("--action"), "Should show action option");
    assert!(stdout.contains("--dry-run"), "Should show dry-run option");
}

/// Test scenario listing as a table
#[test]
fn test_scenarios_table() {
    let output = spread(&["scenarios"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Scenarios should succeed");
    assert!(stdout.contains("NS3.iii"));
    assert!(stdout.contains("podAntiAffinity"));
}

/// Test scenario listing as JSON
#[test]
fn test_scenarios_json() {
    let output = spread(&["scenarios", "--format", "json"]);
    assert!(output.status.success(), "Scenarios should succeed");

    let rows: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    let rows = rows.as_array().expect("Output should be a list");
    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0]["name"], "C1");
}

/// Test showing a stored record as JSON
#[test]
fn test_show_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_record(dir.path());

    let output = spread(&["show", path.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success(), "Show should succeed");

    let record: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    assert_eq!(record["cluster"], "kind-bench");
    assert_eq!(record["elapsed_time"], "0:00:42");
    assert_eq!(record["analysis"]["scale_direction"], "up");
    assert_eq!(record["analysis"]["scale_amount"], 3);
    assert_eq!(record["analysis"]["scale_percentage"], 60.0);
    assert_eq!(record["analysis"]["jain_fairness_index_mean"], 1.0);
}

/// Test showing a stored record as a table
#[test]
fn test_show_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_record(dir.path());

    let output = spread(&["show", path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Show should succeed");
    assert!(stdout.contains("kind-bench"));
    assert!(stdout.contains("Node 00: # (1 pods)"));
    assert!(stdout.contains("Jain fairness index"));
}

/// Test that --no-print hides the bar graphs
#[test]
fn test_show_no_print() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_record(dir.path());

    let output = spread(&["show", path.to_str().unwrap(), "--no-print"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Show should succeed");
    assert!(!stdout.contains("Node 00"));
    assert!(stdout.contains("Analysis"));
}

/// Test that a missing record exits with code 1
#[test]
fn test_show_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    let output = spread(&["show", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

/// Test invalid action is rejected
#[test]
fn test_invalid_action() {
    let output = spread(&["run", "C1", "--namespace", "bench", "--action", "reboot"]);
    assert!(!output.status.success(), "Invalid action should fail");
}

/// Test that run requires a namespace
#[test]
fn test_missing_namespace() {
    let output = spread(&["run", "C1"]);
    assert!(!output.status.success(), "Missing namespace should fail");
}

/// Test that an unknown scenario fails before touching a cluster
#[test]
fn test_unknown_scenario() {
    let output = spread(&["run", "Z9", "--namespace", "bench"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Scenario Z9 not found"));
}

/// Test invalid command
#[test]
fn test_invalid_command() {
    let output = spread(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}
