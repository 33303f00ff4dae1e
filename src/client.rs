//! Client side of the benchmark service's RPC surface.
//!
//! The service exposes two RESTCONF operations: `cleanup-store` resets its
//! test datastore and `start-test` runs one benchmark iteration and reports
//! how long it took. [`BenchmarkService`] is the seam the sweep is written
//! against; [`RestconfClient`] implements it over HTTP.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TargetConfig;
use crate::error::Result;
use crate::params::TestParameters;

const SERVICE: &str = "dsbenchmark";

/// The two operations a campaign needs from the benchmark service.
pub trait BenchmarkService {
    /// Clears the service's test datastore. Returns the HTTP status code;
    /// a non-2xx status is not an error.
    fn cleanup_store(&mut self) -> Result<u16>;

    /// Runs one benchmark iteration. A non-2xx status yields a result with
    /// only [`IterationResult::http_status`] and the error body populated.
    fn start_test(&mut self, params: &TestParameters) -> Result<IterationResult>;
}

/// Outcome of one `start-test` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationResult {
    /// HTTP status of the response.
    pub http_status: u16,
    /// Execution status reported by the service, e.g. `OK`.
    pub status: Option<String>,
    /// Time spent building the test data, in microseconds.
    pub list_build_micros: Option<u64>,
    /// Time spent executing the test, in microseconds.
    pub exec_micros: Option<u64>,
    /// Transactions that committed.
    pub tx_ok: Option<u64>,
    /// Transactions that failed.
    pub tx_error: Option<u64>,
    /// Response body of a non-2xx answer.
    pub error_body: Option<String>,
}

impl IterationResult {
    /// Builds a result from a raw HTTP status and body.
    pub fn from_response(http_status: u16, body: &str) -> Result<Self> {
        if !(200..300).contains(&http_status) {
            return Ok(Self {
                http_status,
                error_body: Some(body.to_string()),
                ..Self::default()
            });
        }
        let envelope: StartTestResponse = serde_json::from_str(body)?;
        let output = envelope.output;
        Ok(Self {
            http_status,
            status: output.status,
            list_build_micros: output.list_build_time,
            exec_micros: output.exec_time,
            tx_ok: output.tx_ok,
            tx_error: output.tx_error,
            error_body: None,
        })
    }

    /// True when the service answered 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    /// Build and execution time, when both were reported.
    pub fn timings(&self) -> Option<(u64, u64)> {
        Some((self.list_build_micros?, self.exec_micros?))
    }
}

#[derive(Serialize)]
struct StartTestRequest<'a> {
    input: &'a TestParameters,
}

#[derive(Deserialize)]
struct StartTestResponse {
    output: StartTestOutput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartTestOutput {
    status: Option<String>,
    list_build_time: Option<u64>,
    exec_time: Option<u64>,
    tx_ok: Option<u64>,
    tx_error: Option<u64>,
}

/// [`BenchmarkService`] over RESTCONF with basic authentication.
pub struct RestconfClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl RestconfClient {
    /// Builds a client for `target`. No request is sent yet.
    pub fn new(target: &TargetConfig) -> Result<Self> {
        let http = Client::builder().timeout(target.timeout).build()?;
        Ok(Self {
            http,
            base_url: target.base_url(),
            username: target.username.clone(),
            password: target.password.clone(),
        })
    }

    /// URL of a `dsbenchmark` operation.
    pub fn operation_url(&self, operation: &str) -> String {
        format!("{}operations/{SERVICE}:{operation}", self.base_url)
    }
}

impl BenchmarkService for RestconfClient {
    fn cleanup_store(&mut self) -> Result<u16> {
        let url = self.operation_url("cleanup-store");
        debug!(%url, "sending cleanup request");
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            warn!(status, "cleanup-store returned a non-success status");
        }
        Ok(status)
    }

    fn start_test(&mut self, params: &TestParameters) -> Result<IterationResult> {
        let url = self.operation_url("start-test");
        debug!(%url, ?params, "sending start-test request");
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
            .json(&StartTestRequest { input: params })
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        if !(200..300).contains(&status) {
            warn!(status, body = %body, "start-test returned a non-success status");
        }
        IterationResult::from_response(status, &body)
    }
}
