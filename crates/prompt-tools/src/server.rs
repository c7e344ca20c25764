//! MCP `ServerHandler` exposing the tool registry.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Span;
use tracing::field::{Empty, display};

use crate::context::CallContext;
use crate::error::ToolError;
use crate::registry::ToolRegistry;

pub const SERVER_NAME: &str = "portkey-mcp-server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Sse,
}

impl Transport {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
        }
    }
}

/// Remote address of an HTTP client. The HTTP host inserts it into request extensions so tool
/// calls can log it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

#[derive(Clone)]
pub struct PromptToolsServer {
    registry: Arc<ToolRegistry>,
    transport: Transport,
    parent: Span,
}

impl PromptToolsServer {
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, transport: Transport) -> Self {
        Self {
            registry,
            transport,
            parent: Span::none(),
        }
    }

    /// Span every call span is nested under. Requests are served on spawned tasks, so
    /// process-wide fields have to be attached explicitly.
    #[must_use]
    pub fn with_parent_span(mut self, span: Span) -> Self {
        self.parent = span;
        self
    }

    fn request_span(&self, context: &RequestContext<RoleServer>) -> Span {
        let span = tracing::info_span!(
            parent: &self.parent,
            "mcp_request",
            transport = self.transport.as_str(),
            http_req_method = Empty,
            http_req_path = Empty,
            http_req_remote_addr = Empty,
        );
        if let Some(parts) = context.extensions.get::<http::request::Parts>() {
            span.record("http_req_method", parts.method.as_str());
            span.record("http_req_path", parts.uri.path());
            if let Some(PeerAddr(addr)) = parts.extensions.get::<PeerAddr>() {
                span.record("http_req_remote_addr", display(addr));
            }
        }
        span
    }
}

impl std::fmt::Debug for PromptToolsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptToolsServer")
            .field("registry", &self.registry)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

fn to_error_data(err: &ToolError) -> ErrorData {
    match err {
        ToolError::UnknownTool(_) => ErrorData::invalid_params(err.to_string(), None),
        ToolError::Cancelled | ToolError::DuplicateTool(_) => {
            ErrorData::internal_error(err.to_string(), None)
        }
    }
}

impl ServerHandler for PromptToolsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Portkey MCP Server".to_string()),
                ..Default::default()
            },
            instructions: Some(
                "Tools for managing Portkey prompts: prompts_list to discover prompt ids, \
                 prompt_render to render a prompt version with variables, prompt_create to add \
                 a prompt to a collection."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(
            self.registry.list_tools(),
        )))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        let span = self.request_span(&context);
        let name = request.name.to_string();
        let ctx = CallContext::new(name.clone())
            .with_span(span)
            .with_cancellation(context.ct.clone());
        let args = request.arguments.unwrap_or_default();

        async move {
            self.registry
                .call(&name, ctx, args)
                .await
                .map_err(|err| to_error_data(&err))
        }
    }
}
