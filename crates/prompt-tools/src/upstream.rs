//! The request pipeline shared by all Portkey tools.
//!
//! Each step returns `Result<_, Halt>`: a [`Halt`] ends the call early, either with a finished
//! tool result (the normal way every failure is reported) or with a [`ToolError`] fault.

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use rmcp::model::{CallToolResult, Content};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::args::{ArgError, json_type_name};
use crate::classify::{ErrorContext, handle_upstream_error};
use crate::config::PortkeyConfig;
use crate::context::CallContext;
use crate::error::ToolError;
use crate::middleware::ToolOutcome;
use crate::redact::{redact_url, sanitize_reqwest_error};

pub const API_KEY_HEADER: &str = "x-portkey-api-key";

const INTERNAL_ERROR: &str = "internal error while processing request";

#[derive(Debug)]
pub(crate) enum Halt {
    Respond(CallToolResult),
    Fault(ToolError),
}

pub(crate) type Step<T> = Result<T, Halt>;

#[derive(Debug)]
pub(crate) struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// A caller-visible error result carrying `message`.
pub(crate) fn failure(message: impl Into<String>) -> Halt {
    Halt::Respond(CallToolResult::error(vec![Content::text(message.into())]))
}

pub(crate) fn invalid_input(err: &ArgError) -> Halt {
    tracing::info!(error = %err, "failed to get user-provided tool arguments from mcp request");
    failure(format!("invalid input: {err}"))
}

pub(crate) fn endpoint(cfg: &PortkeyConfig, segments: &[&str]) -> Step<Url> {
    cfg.endpoint(segments).map_err(|err| {
        tracing::error!(error = %err, "failed to build upstream url");
        failure(INTERNAL_ERROR)
    })
}

pub(crate) fn encode_body<T: Serialize>(body: &T) -> Step<Vec<u8>> {
    serde_json::to_vec(body).map_err(|err| {
        tracing::error!(error = %err, "failed to create request body");
        failure(INTERNAL_ERROR)
    })
}

/// Send one request and read the whole body, aborting if the call is cancelled first.
pub(crate) async fn send(
    ctx: &CallContext,
    cfg: &PortkeyConfig,
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
) -> Step<UpstreamResponse> {
    tracing::debug!(method = %method, url = %redact_url(&url), "calling upstream api");

    let mut request = ctx
        .http_client()
        .request(method, url)
        .header(CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, cfg.api_key.reveal());
    if let Some(body) = body {
        request = request.body(body);
    }

    let exchange = async move {
        let response = request.send().await.map_err(|err| {
            tracing::error!(error = %sanitize_reqwest_error(&err), "failed to call upstream api");
            failure("failed to communicate with upstream service")
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| {
            tracing::error!(error = %sanitize_reqwest_error(&err), "failed to read response body");
            failure("failed to process upstream response")
        })?;
        Ok(UpstreamResponse { status, body })
    };

    tokio::select! {
        biased;
        () = ctx.cancellation().cancelled() => {
            tracing::debug!("upstream request cancelled");
            Err(Halt::Fault(ToolError::Cancelled))
        }
        out = exchange => out,
    }
}

/// Pass a 200 body through; hand anything else to the classifier.
pub(crate) fn require_ok(response: UpstreamResponse, err_ctx: &ErrorContext) -> Step<String> {
    if response.status == 200 {
        return Ok(response.body);
    }
    Err(Halt::Respond(handle_upstream_error(
        response.status,
        &response.body,
        err_ctx,
    )))
}

/// Success bodies must be JSON objects; arrays and scalars are rejected even when every field of
/// `T` is optional.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Step<T> {
    let value: Value = serde_json::from_str(body).map_err(|err| invalid_response(&err))?;
    if !value.is_object() {
        let kind = json_type_name(&value);
        tracing::error!(
            found = kind,
            "invalid response format received from upstream service"
        );
        return Err(failure("received invalid response from upstream service"));
    }
    serde_json::from_value(value).map_err(|err| invalid_response(&err))
}

fn invalid_response(err: &serde_json::Error) -> Halt {
    tracing::error!(error = %err, "invalid response format received from upstream service");
    failure("received invalid response from upstream service")
}

/// Field deserializer mapping an explicit `null` to `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Turn the pipeline's end state into the handler outcome. Success is the raw upstream body.
pub(crate) fn finish(step: Step<String>) -> ToolOutcome {
    match step {
        Ok(body) => Ok(CallToolResult::success(vec![Content::text(body)])),
        Err(Halt::Respond(result)) => Ok(result),
        Err(Halt::Fault(err)) => Err(err),
    }
}
