//! In-process stand-in for the dsbenchmark RESTCONF service.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::{SocketAddr, TcpListener as StdListener};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};

pub const CLEANUP_PATH: &str = "/restconf/operations/dsbenchmark:cleanup-store";
pub const START_TEST_PATH: &str = "/restconf/operations/dsbenchmark:start-test";
/// `admin:admin`
pub const DEFAULT_AUTH: &str = "Basic YWRtaW46YWRtaW4=";

pub const LIST_BUILD_TIME: u64 = 250;
pub const EXEC_TIME: u64 = 500_000;

/// How the fake service answers.
#[derive(Clone)]
pub struct FakeConfig {
    pub expected_auth: String,
    /// Zero-based `start-test` calls that get a 500.
    pub failing_calls: HashSet<usize>,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            expected_auth: DEFAULT_AUTH.to_string(),
            failing_calls: HashSet::new(),
        }
    }
}

/// What the fake service saw.
#[derive(Default, Debug)]
pub struct Recorded {
    pub cleanups: usize,
    pub start_tests: Vec<Value>,
    pub accept_headers: Vec<Option<String>>,
    pub unauthorized: usize,
}

pub struct FakeService {
    pub addr: SocketAddr,
    pub recorded: Arc<Mutex<Recorded>>,
}

impl FakeService {
    pub fn spawn(config: FakeConfig) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let shared = Shared {
            config: Arc::new(config),
            recorded: recorded.clone(),
        };
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind fake service");
                tx.send(listener.local_addr().expect("local addr"))
                    .expect("report address");
                let app = Router::new().fallback(dispatch).with_state(shared);
                axum::serve(listener, app).await.expect("serve fake service");
            });
        });
        let addr = rx.recv().expect("fake service address");
        Self { addr, recorded }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn cleanups(&self) -> usize {
        self.recorded.lock().unwrap().cleanups
    }

    pub fn start_tests(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().start_tests.clone()
    }
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = StdListener::bind("127.0.0.1:0").expect("bind probe");
    listener.local_addr().expect("probe addr").port()
}

#[derive(Clone)]
struct Shared {
    config: Arc<FakeConfig>,
    recorded: Arc<Mutex<Recorded>>,
}

async fn dispatch(
    State(shared): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if auth != Some(shared.config.expected_auth.as_str()) {
        shared.recorded.lock().unwrap().unauthorized += 1;
        return (StatusCode::UNAUTHORIZED, "missing or bad credentials").into_response();
    }

    match uri.path() {
        CLEANUP_PATH => {
            shared.recorded.lock().unwrap().cleanups += 1;
            StatusCode::OK.into_response()
        }
        START_TEST_PATH => {
            let request: Value = match serde_json::from_slice(&body) {
                Ok(value) => value,
                Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            };
            let call = {
                let mut recorded = shared.recorded.lock().unwrap();
                recorded.start_tests.push(request);
                recorded.accept_headers.push(
                    headers
                        .get(header::ACCEPT)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                );
                recorded.start_tests.len() - 1
            };
            if shared.config.failing_calls.contains(&call) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "test already executing")
                    .into_response();
            }
            let output = json!({
                "output": {
                    "status": "OK",
                    "listBuildTime": LIST_BUILD_TIME,
                    "execTime": EXEC_TIME,
                    "txOk": 1,
                    "txError": 0
                }
            });
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                output.to_string(),
            )
                .into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
