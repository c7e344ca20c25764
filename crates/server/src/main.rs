mod config;
mod logging;
mod transport;

use anyhow::Context as _;
use clap::Parser as _;
use portkey_prompt_tools::{MostlyMaskedString, PromptToolsServer, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument as _, Span, error, info};

use crate::config::{AppConfig, Cli, TransportKind};

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    load_dotenv()?;
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let root = logging::root_span();
    let result = runtime.block_on(run(cli, root.clone()).instrument(root.clone()));
    // The stdio transport's blocking stdin read may still be parked.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    let _entered = root.enter();
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "server exited with error");
    }
    info!("goodbye!");
    result
}

/// A missing `.env` file is fine; an unreadable or malformed one is not.
fn load_dotenv() -> anyhow::Result<()> {
    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("load .env"),
    }
}

async fn run(cli: Cli, root: Span) -> anyhow::Result<()> {
    info!("starting up...");

    let api_key_hint = MostlyMaskedString::new(cli.portkey_api_key.reveal());
    let config = AppConfig::from(cli);
    info!(
        config = %serde_json::to_string(&config).context("serialize config")?,
        api_key = %api_key_hint,
        "using config"
    );

    let registry = ToolRegistry::from_config(config.portkey.clone(), &config.tools)
        .context("failed to set up tools")?;
    if registry.is_empty() {
        tracing::warn!("all tools are disabled");
    }

    let server = PromptToolsServer::new(Arc::new(registry), config.transport.into())
        .with_parent_span(root);
    let ct = CancellationToken::new();

    match config.transport {
        TransportKind::Stdio => transport::serve_stdio(server, ct).await,
        TransportKind::Sse => {
            transport::serve_http(server, config.transport_sse_address, ct).await
        }
    }
}
