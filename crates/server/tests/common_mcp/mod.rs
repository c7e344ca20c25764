use anyhow::Context as _;
use futures::StreamExt as _;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::AsyncBufReadExt as _;
use tokio_util::io::StreamReader;

/// Bare-bones MCP client for the streamable HTTP endpoint (`/mcp`), enough to drive the server
/// through a session.
pub struct McpHttpSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl McpHttpSession {
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let endpoint = format!("{}/mcp", base_url.trim_end_matches('/'));

        let init = post(&client, &endpoint, None, &json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "portkey-mcp-server-tests", "version": "0" }
            }
        }))
        .await?;

        let session_id = init
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|h| h.to_str().ok())
            .context("missing Mcp-Session-Id header")?
            .to_string();

        let init_msg = first_event_message(init).await?;
        anyhow::ensure!(init_msg["id"] == json!(0), "unexpected initialize reply: {init_msg}");

        let initialized = post(
            &client,
            &endpoint,
            Some(&session_id),
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await?;
        anyhow::ensure!(
            initialized.status().as_u16() == 202,
            "notifications/initialized returned {}",
            initialized.status()
        );

        Ok(Self {
            client,
            endpoint,
            session_id,
        })
    }

    pub async fn request(&self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        let resp = post(
            &self.client,
            &self.endpoint,
            Some(&self.session_id),
            &json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }),
        )
        .await?;

        tokio::time::timeout(Duration::from_secs(10), first_event_message(resp))
            .await
            .context("timeout waiting for event-stream reply")?
    }

    pub async fn call_tool(&self, id: u64, name: &str, arguments: Value) -> anyhow::Result<Value> {
        let msg = self
            .request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        msg.get("result")
            .cloned()
            .with_context(|| format!("tools/call {name} has no result: {msg}"))
    }
}

/// `result.content[0].text` of a tool call result.
pub fn first_text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}

async fn post(
    client: &reqwest::Client,
    endpoint: &str,
    session_id: Option<&str>,
    body: &Value,
) -> anyhow::Result<reqwest::Response> {
    let mut req = client
        .post(endpoint)
        .header("Accept", "application/json, text/event-stream")
        .json(body);
    if let Some(session_id) = session_id {
        req = req.header("Mcp-Session-Id", session_id);
    }

    req.send()
        .await
        .context("POST /mcp")?
        .error_for_status()
        .context("POST /mcp status")
}

/// First JSON message of an SSE body. Priming events without data are skipped.
async fn first_event_message(resp: reqwest::Response) -> anyhow::Result<Value> {
    let bytes = Box::pin(resp.bytes_stream().map(|r| r.map_err(std::io::Error::other)));
    let mut lines = tokio::io::BufReader::new(StreamReader::new(bytes)).lines();

    let mut data: Vec<String> = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line.is_empty() {
            let joined = data.join("\n");
            data.clear();
            if joined.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&joined).context("event-stream data is not JSON");
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim().to_string());
        }
    }

    anyhow::bail!("event-stream ended without a JSON message")
}
