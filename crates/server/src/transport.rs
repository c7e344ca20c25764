//! Stdio and streamable HTTP hosting for [`PromptToolsServer`].

use anyhow::Context as _;
use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use portkey_prompt_tools::{PeerAddr, PromptToolsServer};
use rmcp::ServiceExt as _;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const MCP_PATH: &str = "/mcp";
pub const HEALTH_PATH: &str = "/health";
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve one client over stdin/stdout until it disconnects or the process is signalled.
pub async fn serve_stdio(server: PromptToolsServer, ct: CancellationToken) -> anyhow::Result<()> {
    info!("starting stdio server");

    let run = async {
        let running = server
            .serve_with_ct(rmcp::transport::stdio(), ct.child_token())
            .await
            .context("stdio session initialization failed")?;
        let reason = running.waiting().await.context("stdio session task failed")?;
        info!(reason = ?reason, "stdio session ended");
        anyhow::Ok(())
    };

    tokio::select! {
        res = run => res,
        signal = shutdown_signal() => {
            info!(signal, "signal received from os");
            ct.cancel();
            Ok(())
        }
    }
}

/// Routes for the HTTP transport: MCP on [`MCP_PATH`] plus a health check.
pub fn router(server: PromptToolsServer, ct: &CancellationToken) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: true,
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route_service(MCP_PATH, service)
        .layer(middleware::from_fn(log_http_request))
}

/// Serve HTTP on `addr` until signalled, then drain for at most [`SHUTDOWN_TIMEOUT`].
pub async fn serve_http(
    server: PromptToolsServer,
    addr: SocketAddr,
    ct: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(server, &ct);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(address = %listener.local_addr()?, "starting sse server");

    let shutdown = ct.clone();
    let mut server_task = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    });

    tokio::select! {
        res = &mut server_task => {
            return match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(err).context("sse server failed"),
                Err(err) => Err(err).context("sse server task failed"),
            };
        }
        signal = shutdown_signal() => info!(signal, "signal received from os"),
    }

    info!("shutting down sse server...");
    ct.cancel();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, server_task).await {
        Ok(Ok(Ok(()))) => info!("sse server has been shut down gracefully"),
        Ok(Ok(Err(err))) => warn!(error = %err, "sse server shutdown failed"),
        Ok(Err(err)) => warn!(error = %err, "sse server task failed during shutdown"),
        Err(_) => warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "sse server did not shut down in time"
        ),
    }
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn log_http_request(
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    tracing::debug!(
        http_req_method = %request.method(),
        http_req_path = request.uri().path(),
        http_req_remote_addr = %remote,
        "processing http request"
    );
    request.extensions_mut().insert(PeerAddr(remote));
    next.run(request).await
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}
