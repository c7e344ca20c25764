//! JSON logs on stderr. Stdout belongs to the stdio transport.

use anyhow::Context as _;
use tracing::{Metadata, Span};
use tracing_subscriber::filter::{EnvFilter, filter_fn};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{Layer as _, fmt};

use crate::config::LogLevel;

pub const APP_NAME: &str = "Portkey MCP Server";

/// Span targets kept regardless of level so request and call fields reach every record.
const OWN_TARGETS: [&str; 2] = ["portkey_mcp_server", "portkey_prompt_tools"];

/// `RUST_LOG`, when set, replaces the `LOG_LEVEL` filter entirely.
pub fn init(level: LogLevel) -> anyhow::Result<()> {
    let layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_current_span(false)
        .with_span_list(true);

    let rust_log = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty());

    match rust_log {
        Some(directives) => {
            let filter = EnvFilter::try_new(&directives)
                .with_context(|| format!("invalid RUST_LOG {directives:?}"))?;
            tracing_subscriber::registry()
                .with(layer.with_filter(filter))
                .try_init()
        }
        None => {
            let max = level.as_level();
            tracing_subscriber::registry()
                .with(layer.with_filter(filter_fn(move |meta: &Metadata<'_>| enabled(meta, max))))
                .try_init()
        }
    }
    .context("install tracing subscriber")
}

fn enabled(meta: &Metadata<'_>, max: tracing::Level) -> bool {
    if meta.is_span() {
        return OWN_TARGETS.iter().any(|t| meta.target().starts_with(t));
    }
    *meta.level() <= max
}

/// Root span carrying process-wide fields.
pub fn root_span() -> Span {
    tracing::info_span!(
        "app",
        app_name = APP_NAME,
        app_version = env!("CARGO_PKG_VERSION"),
    )
}
