//! Fakes shared by the unit tests: an in-process Portkey API and a JSON log capture.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::routing::any;
use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::{HttpClientConfig, PortkeyConfig};
use crate::secret::MaskedString;

pub(crate) const TEST_API_KEY: &str = "pk-test-key-0123";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

struct Canned {
    status: StatusCode,
    body: String,
    delay: Duration,
    seen: Mutex<Vec<RecordedRequest>>,
}

/// Answers every request with one canned response and records what it received.
pub(crate) struct MockUpstream {
    pub base_url: String,
    state: Arc<Canned>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, body: &str, delay: Duration) -> Self {
        async fn handler(
            State(state): State<Arc<Canned>>,
            method: Method,
            uri: Uri,
            headers: HeaderMap,
            body: String,
        ) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
            let header_str = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            state.seen.lock().push(RecordedRequest {
                method: method.to_string(),
                path: uri.path().to_string(),
                query: uri.query().map(str::to_string),
                api_key: header_str("x-portkey-api-key"),
                content_type: header_str("content-type"),
                body,
            });
            if !state.delay.is_zero() {
                tokio::time::sleep(state.delay).await;
            }
            (
                state.status,
                [(header::CONTENT_TYPE, "application/json")],
                state.body.clone(),
            )
        }

        let state = Arc::new(Canned {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: body.to_string(),
            delay,
            seen: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/{*path}", any(handler))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move { server.await });

        Self {
            base_url: format!("http://{addr}/v1"),
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.seen.lock().clone()
    }

    pub fn hits(&self) -> usize {
        self.state.seen.lock().len()
    }

    pub fn portkey_config(&self) -> PortkeyConfig {
        PortkeyConfig {
            api_key: MaskedString::new(TEST_API_KEY),
            base_url: self.base_url.clone(),
            client: HttpClientConfig::default(),
        }
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Collects JSON log lines emitted while the returned guard is alive on this thread.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn records(&self) -> Vec<Value> {
        let raw = self.0.lock().clone();
        String::from_utf8_lossy(&raw)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("json log line"))
            .collect()
    }

    /// First record whose message equals `message`.
    pub fn find(&self, message: &str) -> Option<Value> {
        self.records()
            .into_iter()
            .find(|r| r["fields"]["message"] == message)
    }
}

pub(crate) struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(self.0.clone())
    }
}

/// Text of the first content item of a tool result.
pub(crate) fn result_text(result: &rmcp::model::CallToolResult) -> String {
    let v = serde_json::to_value(result).expect("CallToolResult serializes");
    v["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string()
}

pub(crate) fn args(v: Value) -> rmcp::model::JsonObject {
    v.as_object().cloned().expect("object literal")
}
