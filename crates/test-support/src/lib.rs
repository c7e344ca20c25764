//! Helpers shared by the server's process-level integration tests.

use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::any;
use parking_lot::Mutex;
use std::io::{BufRead as _, BufReader, Read};
use std::net::{SocketAddr, TcpListener};
use std::process::Child;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status.
///
/// # Errors
///
/// Returns an error if the timeout elapses first.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// Lines of a child process stream, collected on a background thread.
#[derive(Clone, Default)]
pub struct CapturedLines(Arc<Mutex<Vec<String>>>);

impl CapturedLines {
    /// Start draining `reader` until EOF.
    pub fn spawn(reader: impl Read + Send + 'static) -> Self {
        let lines = Self::default();
        let sink = Arc::clone(&lines.0);
        std::thread::spawn(move || {
            for line in BufReader::new(reader).lines() {
                let Ok(line) = line else { break };
                sink.lock().push(line);
            }
        });
        lines
    }

    /// Lines that parse as JSON objects.
    #[must_use]
    pub fn json_records(&self) -> Vec<serde_json::Value> {
        self.0
            .lock()
            .iter()
            .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
            .filter(serde_json::Value::is_object)
            .collect()
    }

    /// Poll until a JSON record whose `fields.message` equals `message` shows up.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout elapses first.
    pub async fn wait_for_message(
        &self,
        message: &str,
        timeout_dur: Duration,
    ) -> anyhow::Result<serde_json::Value> {
        let start = Instant::now();
        loop {
            if let Some(rec) = self
                .json_records()
                .into_iter()
                .find(|r| r["fields"]["message"] == message)
            {
                return Ok(rec);
            }
            if start.elapsed() > timeout_dur {
                anyhow::bail!("no log record with message {message:?}");
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// A request as seen by [`MockPortkey`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    /// Path and query, e.g. `/v1/prompts?page_size=2`.
    pub uri: String,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: Arc<str>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// Stand-in for the Portkey API answering every request with one canned JSON response.
pub struct MockPortkey {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockPortkey {
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(status: u16, body: &str) -> anyhow::Result<Self> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status: StatusCode::from_u16(status).context("status code")?,
            body: Arc::from(body),
            seen: Arc::clone(&seen),
        };
        let app = Router::new()
            .route("/{*path}", any(respond))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock portkey")?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
        });

        Ok(Self {
            addr,
            seen,
            shutdown: Some(tx),
        })
    }

    /// Value for `PORTKEY_BASE_URL`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }
}

impl Drop for MockPortkey {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn respond(State(state): State<MockState>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_else(|_| Bytes::new());
    state.seen.lock().push(SeenRequest {
        method: parts.method.to_string(),
        uri: parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string),
        api_key: parts
            .headers
            .get("x-portkey-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null),
    });
    (
        state.status,
        [("content-type", "application/json")],
        state.body.to_string(),
    )
}
