#![allow(dead_code)]

use anyhow::Context as _;
use std::process::{Command, Stdio};
use std::time::Duration;

pub use portkey_test_support::{
    CapturedLines, KillOnDrop, MockPortkey, pick_unused_port, wait_http_ok,
};

pub const TEST_API_KEY: &str = "pk-integration-0123";

/// A server process listening on the HTTP transport.
pub struct RunningServer {
    pub base_url: String,
    /// JSON log lines the server wrote to stderr.
    pub logs: CapturedLines,
    _child: KillOnDrop,
}

/// Start the binary on the HTTP transport against `portkey_base_url` and wait until it is healthy.
pub async fn spawn_http_server(
    portkey_base_url: &str,
    extra_env: &[(&str, &str)],
) -> anyhow::Result<RunningServer> {
    let port = pick_unused_port()?;
    let bin = env!("CARGO_BIN_EXE_portkey-mcp-server");
    let mut cmd = Command::new(bin);
    cmd.env_clear()
        .env("TRANSPORT", "sse")
        .env("TRANSPORT_SSE_ADDRESS", format!("127.0.0.1:{port}"))
        .env("PORTKEY_API_KEY", TEST_API_KEY)
        .env("PORTKEY_BASE_URL", portkey_base_url)
        .env("LOG_LEVEL", "debug")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    let mut child = cmd.spawn().context("spawn portkey-mcp-server")?;
    let logs = CapturedLines::spawn(child.stderr.take().context("child stderr")?);
    let child = KillOnDrop(child);

    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(15)).await?;
    Ok(RunningServer {
        base_url,
        logs,
        _child: child,
    })
}
