//! Per-call context threaded through the middleware chain into a tool handler.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Timeout of the client used when no HTTP client was attached to a call.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// State owned by a single in-flight tool call.
///
/// Interceptors fill in the optional services; handlers read them through accessors that fall
/// back to sensible defaults, so a bare context is always usable.
#[derive(Debug, Clone)]
pub struct CallContext {
    tool_name: String,
    span: Option<Span>,
    http_client: Option<reqwest::Client>,
    cancellation: CancellationToken,
}

impl CallContext {
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            span: None,
            http_client: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Parent span carrying transport metadata for this call.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// The call's span, or the ambient span when none was attached.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span.clone().unwrap_or_else(Span::current)
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = Some(span);
    }

    #[must_use]
    pub fn has_http_client(&self) -> bool {
        self.http_client.is_some()
    }

    pub fn set_http_client(&mut self, client: reqwest::Client) {
        self.http_client = Some(client);
    }

    /// The shared client, or a fresh default one if no interceptor attached it.
    #[must_use]
    pub fn http_client(&self) -> reqwest::Client {
        match &self.http_client {
            Some(client) => client.clone(),
            None => default_http_client(),
        }
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Client with the fixed default timeout, no cookie store and default redirect handling.
#[must_use]
pub fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_CLIENT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
