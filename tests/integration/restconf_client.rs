#![allow(missing_docs)]

mod support;

use std::collections::HashSet;
use std::time::Duration;

use dsbench::client::{BenchmarkService, RestconfClient};
use dsbench::config::TargetConfig;
use dsbench::params::{DataFormat, Datastore, Operation, TestParameters, TxType};
use dsbench::BenchError;
use serde_json::json;
use support::{closed_port, FakeConfig, FakeService, EXEC_TIME, LIST_BUILD_TIME};

fn target(port: u16) -> TargetConfig {
    TargetConfig {
        host: "127.0.0.1".into(),
        port,
        timeout: Some(Duration::from_secs(10)),
        ..TargetConfig::default()
    }
}

fn params() -> TestParameters {
    TestParameters {
        tx_type: TxType::Simple,
        operation: Operation::Delete,
        data_format: DataFormat::BindingAware,
        datastore: Datastore::Both,
        outer_elements: 1_000,
        inner_elements: 100,
        ops_per_tx: 10,
    }
}

#[test]
fn cleanup_store_reports_status() {
    let service = FakeService::spawn(FakeConfig::default());
    let mut client = RestconfClient::new(&target(service.port())).expect("client");
    assert_eq!(client.cleanup_store().expect("cleanup"), 200);
    assert_eq!(service.cleanups(), 1);
}

#[test]
fn start_test_sends_input_envelope_and_parses_output() {
    let service = FakeService::spawn(FakeConfig::default());
    let mut client = RestconfClient::new(&target(service.port())).expect("client");
    let result = client.start_test(&params()).expect("start-test");

    assert!(result.is_success());
    assert_eq!(result.timings(), Some((LIST_BUILD_TIME, EXEC_TIME)));
    assert_eq!(result.tx_ok, Some(1));

    let requests = service.start_tests();
    assert_eq!(
        requests,
        vec![json!({
            "input": {
                "transaction-type": "SIMPLE-TX",
                "operation": "DELETE",
                "data-format": "BINDING-AWARE",
                "data-store": "BOTH",
                "outerElements": 1000,
                "innerElements": 100,
                "putsPerTx": 10
            }
        })]
    );
    let accept = service.recorded.lock().unwrap().accept_headers[0].clone();
    assert_eq!(accept.as_deref(), Some("application/json"));
}

#[test]
fn server_error_yields_partial_result() {
    let service = FakeService::spawn(FakeConfig {
        failing_calls: HashSet::from([0]),
        ..FakeConfig::default()
    });
    let mut client = RestconfClient::new(&target(service.port())).expect("client");

    let failed = client.start_test(&params()).expect("non-2xx is not an error");
    assert_eq!(failed.http_status, 500);
    assert_eq!(failed.timings(), None);
    assert_eq!(failed.error_body.as_deref(), Some("test already executing"));

    let next = client.start_test(&params()).expect("second call");
    assert!(next.is_success());
}

#[test]
fn wrong_credentials_are_reported_not_raised() {
    let service = FakeService::spawn(FakeConfig::default());
    let mut target = target(service.port());
    target.password = "wrong".into();
    let mut client = RestconfClient::new(&target).expect("client");

    assert_eq!(client.cleanup_store().expect("cleanup"), 401);
    let result = client.start_test(&params()).expect("start-test");
    assert_eq!(result.http_status, 401);
    assert_eq!(service.recorded.lock().unwrap().unauthorized, 2);
}

#[test]
fn connection_refused_is_a_transport_error() {
    let mut client = RestconfClient::new(&target(closed_port())).expect("client");
    let err = client.start_test(&params()).unwrap_err();
    assert!(matches!(err, BenchError::Transport(_)), "{err:?}");
}
