#![allow(missing_docs)]

mod support;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use csv::ReaderBuilder;
use support::{closed_port, FakeConfig, FakeService};
use tempfile::TempDir;

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("dsbench.toml");
    fs::write(&config, "").expect("write empty config");
    (dir, config)
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .expect("open report")
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect()
}

fn base_args(port: u16, config: &Path) -> Vec<String> {
    vec![
        "--host".into(),
        "127.0.0.1".into(),
        "--port".into(),
        port.to_string(),
        "--config".into(),
        config.display().to_string(),
        "--theme".into(),
        "plain".into(),
        "--txtype".into(),
        "TX-CHAINING".into(),
        "--optype".into(),
        "PUT".into(),
        "--format".into(),
        "BINDING-AWARE".into(),
        "--datastore".into(),
        "CONFIG".into(),
    ]
}

#[test]
fn single_data_format_combination_writes_one_row() {
    let service = FakeService::spawn(FakeConfig::default());
    let (dir, config) = workspace();

    let output = cargo_bin_cmd!("dsbench")
        .current_dir(dir.path())
        .env_remove("DSBENCH_USER")
        .env_remove("DSBENCH_PASSWORD")
        .args(base_args(service.port(), &config))
        .args(["--test", "DATA-FORMAT", "--total", "100000", "--inner", "1"])
        .args(["--warmup", "0", "--runs", "1"])
        .output()
        .expect("run dsbench");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(service.cleanups(), 1);
    let requests = service.start_tests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["input"]["outerElements"], 100_000);
    assert_eq!(requests[0]["input"]["innerElements"], 1);
    assert_eq!(requests[0]["input"]["putsPerTx"], 1);

    let rows = read_rows(&dir.path().join("test.csv"));
    assert_eq!(
        rows,
        vec![
            vec!["TX-CHAINING:", "", ""],
            vec!["", "BINDING-AWARE:", ""],
            vec!["", "", "PUT:"],
            vec!["", "", "", "CONFIG:"],
            vec!["", "", "", "", "100000/1", "250", "500000", "500250", "200000", "200000"],
        ]
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TEST #0: status: OK"));
    assert!(stdout.contains("tx_rate: 200000, upd_rate: 200000"));
}

#[test]
fn both_tests_honor_warmup_and_output_path() {
    let service = FakeService::spawn(FakeConfig::default());
    let (dir, config) = workspace();
    let report = dir.path().join("out").join("campaign.csv");
    fs::create_dir_all(report.parent().unwrap()).unwrap();

    cargo_bin_cmd!("dsbench")
        .current_dir(dir.path())
        .args(base_args(service.port(), &config))
        .args(["--total", "1000", "--inner", "1", "10", "--ops", "100"])
        .args(["--warmup", "2", "--runs", "3", "--quiet"])
        .arg("--output")
        .arg(&report)
        .assert()
        .success();

    // 3 leaves (two shapes, one ops value), 5 calls each
    assert_eq!(service.start_tests().len(), 15);
    assert_eq!(service.cleanups(), 1);

    let rows = read_rows(&report);
    let data: Vec<&Vec<String>> = rows.iter().filter(|r| r.len() == 10).collect();
    let labels: Vec<&str> = data.iter().map(|r| r[4].as_str()).collect();
    assert_eq!(labels, vec!["1000/1", "100/10", "100"]);
    // 1000 / 100 transactions over half a second
    assert_eq!(data[2][8], "20");
    assert!(!dir.path().join("test.csv").exists());
}

#[test]
fn failing_iteration_keeps_the_campaign_running() {
    let service = FakeService::spawn(FakeConfig {
        failing_calls: HashSet::from([0]),
        ..FakeConfig::default()
    });
    let (dir, config) = workspace();

    let output = cargo_bin_cmd!("dsbench")
        .current_dir(dir.path())
        .args(base_args(service.port(), &config))
        .args(["--test", "DATA-FORMAT", "--inner", "1", "10"])
        .args(["--warmup", "0", "--runs", "1"])
        .output()
        .expect("run dsbench");
    assert!(output.status.success());
    assert_eq!(service.start_tests().len(), 2);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error 500, test already executing"));

    let rows = read_rows(&dir.path().join("test.csv"));
    let data: Vec<&Vec<String>> = rows.iter().filter(|r| r.len() == 10).collect();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0][8], "");
    assert_eq!(data[1][4], "10000/10");
}

#[test]
fn unreachable_service_fails_without_data_rows() {
    let (dir, config) = workspace();
    cargo_bin_cmd!("dsbench")
        .current_dir(dir.path())
        .args(base_args(closed_port(), &config))
        .args(["--warmup", "0", "--runs", "1"])
        .assert()
        .failure();
    let report = dir.path().join("test.csv");
    assert!(report.exists());
    assert!(read_rows(&report).is_empty());
}

#[test]
fn zero_measured_runs_is_rejected_before_any_request() {
    let service = FakeService::spawn(FakeConfig::default());
    let (dir, config) = workspace();
    let output = cargo_bin_cmd!("dsbench")
        .current_dir(dir.path())
        .args(base_args(service.port(), &config))
        .args(["--runs", "0"])
        .output()
        .expect("run dsbench");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid runs"));
    assert_eq!(service.cleanups(), 0);
    assert!(!dir.path().join("test.csv").exists());
}

#[test]
fn config_file_supplies_credentials_and_sweep() {
    let service = FakeService::spawn(FakeConfig {
        expected_auth: "Basic b3BlcmF0b3I6czNjcmV0".into(),
        ..FakeConfig::default()
    });
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("dsbench.toml");
    fs::write(
        &config,
        format!(
            r#"
output = "from-config.csv"

[target]
host = "127.0.0.1"
port = {}
username = "operator"
password = "s3cret"

[sweep]
txtype = ["SIMPLE-TX"]
optype = ["READ"]
format = ["BINDING-INDEPENDENT"]
datastore = ["OPERATIONAL"]
test = ["OPS-PER-TX"]
ops = [1]
warmup = 0
runs = 1
"#,
            service.port()
        ),
    )
    .unwrap();

    cargo_bin_cmd!("dsbench")
        .current_dir(dir.path())
        .env_remove("DSBENCH_USER")
        .env_remove("DSBENCH_PASSWORD")
        .args(["--config", config.to_str().unwrap(), "--theme", "plain"])
        .assert()
        .success();

    assert_eq!(service.recorded.lock().unwrap().unauthorized, 0);
    let requests = service.start_tests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["input"]["transaction-type"], "SIMPLE-TX");
    assert_eq!(requests[0]["input"]["data-store"], "OPERATIONAL");
    let rows = read_rows(&dir.path().join("from-config.csv"));
    assert_eq!(rows[0], vec!["SIMPLE-TX:", "", ""]);
}
