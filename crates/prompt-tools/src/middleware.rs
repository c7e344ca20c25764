//! Tool handlers and the interceptor chain wrapped around them.
//!
//! [`chain`] composes interceptors `[m1, .., mn]` around a handler `h` so a call runs
//! `m1 -> .. -> mn -> h` and unwinds in reverse. Earlier interceptors set up context (span,
//! HTTP client) that later ones and the handler observe.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use std::sync::Arc;
use tracing::Instrument as _;

use crate::context::CallContext;
use crate::error::ToolError;

pub type ToolOutcome = Result<CallToolResult, ToolError>;

/// Terminal step of a tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: CallContext, args: JsonObject) -> ToolOutcome;
}

/// A wrapper around the rest of the chain.
///
/// Implementations may adjust `ctx` before delegating to `next`, inspect the outcome after it
/// returns, or answer directly without delegating.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(
        &self,
        ctx: CallContext,
        args: JsonObject,
        next: &dyn ToolHandler,
    ) -> ToolOutcome;
}

struct Intercepted {
    interceptor: Arc<dyn Interceptor>,
    next: Arc<dyn ToolHandler>,
}

#[async_trait]
impl ToolHandler for Intercepted {
    async fn call(&self, ctx: CallContext, args: JsonObject) -> ToolOutcome {
        self.interceptor
            .intercept(ctx, args, self.next.as_ref())
            .await
    }
}

/// Wrap `handler` so that `interceptors[0]` is the outermost layer.
#[must_use]
pub fn chain(
    handler: Arc<dyn ToolHandler>,
    interceptors: &[Arc<dyn Interceptor>],
) -> Arc<dyn ToolHandler> {
    interceptors.iter().rev().fold(handler, |next, interceptor| {
        Arc::new(Intercepted {
            interceptor: interceptor.clone(),
            next,
        })
    })
}

/// Opens a `tool_call` span (child of the call's transport span) and reports the outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(
        &self,
        mut ctx: CallContext,
        args: JsonObject,
        next: &dyn ToolHandler,
    ) -> ToolOutcome {
        let parent = ctx.span();
        let span = tracing::info_span!(parent: &parent, "tool_call", tool_name = %ctx.tool_name());
        ctx.set_span(span.clone());

        async move {
            tracing::debug!("processing tool call request");

            let outcome = next.call(ctx, args).await;
            match &outcome {
                Err(err) => tracing::error!(error = %err, "tool call request failed"),
                Ok(result) if result.is_error == Some(true) => tracing::info!(
                    is_error = true,
                    "tool call request completed with error response"
                ),
                Ok(_) => tracing::debug!("tool call request completed successfully"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

/// Attaches the process-wide HTTP client to each call.
#[derive(Debug, Clone)]
pub struct HttpClientInterceptor {
    client: reqwest::Client,
}

impl HttpClientInterceptor {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Interceptor for HttpClientInterceptor {
    async fn intercept(
        &self,
        mut ctx: CallContext,
        args: JsonObject,
        next: &dyn ToolHandler,
    ) -> ToolOutcome {
        ctx.set_http_client(self.client.clone());
        next.call(ctx, args).await
    }
}

/// The default stack: logging outermost, then HTTP client injection.
#[must_use]
pub fn default_interceptors(client: reqwest::Client) -> Vec<Arc<dyn Interceptor>> {
    vec![
        Arc::new(LoggingInterceptor),
        Arc::new(HttpClientInterceptor::new(client)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::CapturedLogs;
    use parking_lot::Mutex;
    use rmcp::model::Content;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Marker {
        name: &'static str,
        trace: Trace,
    }

    #[async_trait]
    impl Interceptor for Marker {
        async fn intercept(
            &self,
            ctx: CallContext,
            args: JsonObject,
            next: &dyn ToolHandler,
        ) -> ToolOutcome {
            self.trace.lock().push(format!("{}-before", self.name));
            let out = next.call(ctx, args).await;
            self.trace.lock().push(format!("{}-after", self.name));
            out
        }
    }

    struct Recording {
        trace: Trace,
        outcome: fn() -> ToolOutcome,
    }

    #[async_trait]
    impl ToolHandler for Recording {
        async fn call(&self, ctx: CallContext, _args: JsonObject) -> ToolOutcome {
            self.trace
                .lock()
                .push(format!("H(client={})", ctx.has_http_client()));
            (self.outcome)()
        }
    }

    fn ok() -> ToolOutcome {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    fn error_result() -> ToolOutcome {
        Ok(CallToolResult::error(vec![Content::text("nope")]))
    }

    fn fault() -> ToolOutcome {
        Err(ToolError::Cancelled)
    }

    fn recording(trace: &Trace, outcome: fn() -> ToolOutcome) -> Arc<dyn ToolHandler> {
        Arc::new(Recording {
            trace: trace.clone(),
            outcome,
        })
    }

    #[tokio::test]
    async fn chain_runs_first_interceptor_outermost() {
        let trace: Trace = Arc::default();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Marker {
                name: "A",
                trace: trace.clone(),
            }),
            Arc::new(Marker {
                name: "B",
                trace: trace.clone(),
            }),
        ];

        let handler = chain(recording(&trace, ok), &interceptors);
        handler
            .call(CallContext::new("t"), JsonObject::new())
            .await
            .expect("ok");

        assert_eq!(
            *trace.lock(),
            ["A-before", "B-before", "H(client=false)", "B-after", "A-after"]
        );
    }

    #[tokio::test]
    async fn empty_chain_is_the_handler() {
        let trace: Trace = Arc::default();
        let handler = chain(recording(&trace, ok), &[]);
        handler
            .call(CallContext::new("t"), JsonObject::new())
            .await
            .expect("ok");
        assert_eq!(*trace.lock(), ["H(client=false)"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_inner_layers() {
        struct Deny;

        #[async_trait]
        impl Interceptor for Deny {
            async fn intercept(
                &self,
                _ctx: CallContext,
                _args: JsonObject,
                _next: &dyn ToolHandler,
            ) -> ToolOutcome {
                Ok(CallToolResult::error(vec![Content::text("denied")]))
            }
        }

        let trace: Trace = Arc::default();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(Deny)];
        let result = chain(recording(&trace, ok), &interceptors)
            .call(CallContext::new("t"), JsonObject::new())
            .await
            .expect("ok");
        assert_eq!(result.is_error, Some(true));
        assert!(trace.lock().is_empty());
    }

    #[tokio::test]
    async fn http_client_interceptor_is_visible_to_the_handler() {
        let trace: Trace = Arc::default();
        let handler = chain(
            recording(&trace, ok),
            &default_interceptors(reqwest::Client::new()),
        );
        handler
            .call(CallContext::new("t"), JsonObject::new())
            .await
            .expect("ok");
        assert_eq!(*trace.lock(), ["H(client=true)"]);
    }

    async fn run_logged(outcome: fn() -> ToolOutcome) -> (CapturedLogs, ToolOutcome) {
        let logs = CapturedLogs::default();
        let _guard = logs.install();
        let trace: Trace = Arc::default();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(LoggingInterceptor)];
        let out = chain(recording(&trace, outcome), &interceptors)
            .call(CallContext::new("prompts_list"), JsonObject::new())
            .await;
        (logs, out)
    }

    #[tokio::test]
    async fn logging_success_is_debug_and_tagged_with_tool_name() {
        let (logs, out) = run_logged(ok).await;
        assert!(out.is_ok());

        let start = logs.find("processing tool call request").expect("start");
        assert_eq!(start["level"], "DEBUG");
        assert_eq!(start["span"]["tool_name"], "prompts_list");

        let done = logs
            .find("tool call request completed successfully")
            .expect("done");
        assert_eq!(done["level"], "DEBUG");
    }

    #[tokio::test]
    async fn logging_error_result_is_info_and_result_is_untouched() {
        let (logs, out) = run_logged(error_result).await;
        let result = out.expect("result");
        assert_eq!(result.is_error, Some(true));

        let done = logs
            .find("tool call request completed with error response")
            .expect("done");
        assert_eq!(done["level"], "INFO");
        assert_eq!(done["fields"]["is_error"], true);
    }

    #[tokio::test]
    async fn logging_fault_is_error() {
        let (logs, out) = run_logged(fault).await;
        assert!(matches!(out, Err(ToolError::Cancelled)));

        let done = logs.find("tool call request failed").expect("done");
        assert_eq!(done["level"], "ERROR");
    }
}
