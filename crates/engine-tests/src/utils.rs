#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use engine_config::settings::Settings;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::debug;

pub const TEST_TOKEN: &str = "test-token";

/// A request received by the stub server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

impl CapturedRequest {
    /// Numbers listed in the `contacts` array of the body.
    pub fn numbers(&self) -> Vec<String> {
        self.body["contacts"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    pub fn json(status: u16, body: Value) -> Self {
        StubReply {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        StubReply::json(status, json!({"errors": [{"code": status}]}))
    }

    pub fn raw(status: u16, body: &str) -> Self {
        StubReply {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Builds the reply for one request; receives the zero-based call number.
pub type Responder = Arc<dyn Fn(&CapturedRequest, usize) -> StubReply + Send + Sync>;

/// Shared state of the stub's `/v1/contacts` route.
#[derive(Clone)]
struct StubState {
    responder: Responder,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    calls: Arc<AtomicUsize>,
}

/// Local axum server standing in for the contacts endpoint.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(responder: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = StubState {
            responder,
            requests: Arc::clone(&requests),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/v1/contacts", post(contacts_handler))
            .with_state(state);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                debug!(error = %e, "Stub server stopped");
            }
        });

        StubServer {
            addr,
            requests,
            handle,
        }
    }

    /// Answers every batch from a fixed number → provider token table.
    /// Numbers missing from the table are left out of the reply.
    pub async fn contacts<const N: usize>(table: [(&str, &str); N]) -> Self {
        let table: HashMap<String, String> = table
            .into_iter()
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();

        Self::start(Arc::new(move |request: &CapturedRequest, _call: usize| {
            StubReply::json(200, reply_for(&request.numbers(), |n| table.get(n).cloned()))
        }))
        .await
    }

    /// Reports every number with the same token.
    pub async fn uniform(token: &'static str) -> Self {
        Self::start(Arc::new(move |request: &CapturedRequest, _call: usize| {
            StubReply::json(200, reply_for(&request.numbers(), |_| Some(token.to_string())))
        }))
        .await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// `{"contacts": [{"input", "status"}]}` for the numbers `status_of` knows.
pub fn reply_for<F>(numbers: &[String], status_of: F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    let contacts: Vec<Value> = numbers
        .iter()
        .filter_map(|n| {
            let status = status_of(n)?;
            Some(json!({"input": n, "status": status, "wa_id": n.trim_start_matches('+')}))
        })
        .collect();
    json!({ "contacts": contacts })
}

async fn contacts_handler(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request = CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    let call = state.calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(request.clone());
    let reply = (state.responder)(&request, call);
    debug!(call, status = reply.status, "Stub replying");

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap();
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

/// Settings pointing at the stub, with short backoffs.
pub fn stub_settings(server: &StubServer, number_column: &str) -> Settings {
    Settings::builder()
        .base_url(server.base_url())
        .token(TEST_TOKEN)
        .number_column(number_column)
        .concurrency(4)
        .batch_size(50)
        .max_retries(6)
        .backoff(Duration::from_millis(10), Duration::from_millis(80))
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Values of one column of a CSV string, header excluded.
pub fn column_values(csv: &str, column: usize) -> Vec<String> {
    csv::Reader::from_reader(csv.as_bytes())
        .records()
        .map(|record| record.unwrap().get(column).unwrap_or_default().to_string())
        .collect()
}
