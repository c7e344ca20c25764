//! `prompt_render`: render a prompt version with variables substituted.

use async_trait::async_trait;
use reqwest::Method;
use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::args::{ArgResult, Args};
use crate::classify::ErrorContext;
use crate::config::{PortkeyConfig, ToolConfig};
use crate::context::CallContext;
use crate::middleware::{ToolHandler, ToolOutcome};
use crate::semantics::read_only_annotations;
use crate::tool::{ParamKind, ParamSpec, ToolDescriptor};
use crate::upstream::{
    Step, decode, encode_body, endpoint, failure, finish, invalid_input, null_as_default,
    require_ok, send,
};

pub const NAME: &str = "prompt_render";

const DEFAULT_DESCRIPTION: &str = "Render a Portkey prompt template and return the raw payload. \
This is a way to obtain a prompt with optional variables substituted in. You can select specific \
versions of a prompt, or use the currently published version.";

fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::required(
            "prompt_id",
            ParamKind::String,
            "The ID of the Portkey prompt to render.",
        ),
        ParamSpec::optional(
            "prompt_tag",
            ParamKind::String,
            "Specific prompt version or label (e.g. '12', 'latest'). If omitted the published \
             version is used.",
        ),
        ParamSpec::optional(
            "variables",
            ParamKind::StringMap,
            "Variables object to substitute into the prompt template. The object should be a \
             JSON object with key-value pairs of string variable names to string values.",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    pub prompt_id: String,
    pub prompt_tag: Option<String>,
    pub variables: BTreeMap<String, String>,
}

impl RenderArgs {
    pub fn from_args(raw: &JsonObject) -> ArgResult<Self> {
        let args = Args::new(raw);
        Ok(Self {
            prompt_id: args.required_str("prompt_id")?,
            prompt_tag: args.optional_str("prompt_tag")?,
            variables: args.optional_string_map("variables")?.unwrap_or_default(),
        })
    }

    /// `{id}` or `{id}@{tag}`.
    #[must_use]
    pub fn endpoint_id(&self) -> String {
        match &self.prompt_tag {
            Some(tag) => format!("{}@{tag}", self.prompt_id),
            None => self.prompt_id.clone(),
        }
    }
}

/// Body of `POST /prompts/{id}/render`. `variables` is always sent, empty if none were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRenderRequest {
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptRenderResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: RenderedPrompt,
}

/// A chat-completions style request body produced by rendering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderedPrompt {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<RenderedMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub logit_bias: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    pub logprobs: Option<bool>,
    #[serde(default)]
    pub top_logprobs: Option<i64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub n: Option<i64>,
    #[serde(default)]
    pub presence_penalty: Option<f64>,
    #[serde(default)]
    pub response_format: Option<Value>,
    #[serde(default)]
    pub seed: Option<i64>,
    /// String or array of strings.
    #[serde(default)]
    pub stop: Option<Value>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub stream_options: Option<Value>,
    #[serde(default)]
    pub thinking: Option<Value>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub tools: Option<Vec<Value>>,
    /// String or object.
    #[serde(default)]
    pub tool_choice: Option<Value>,
    #[serde(default)]
    pub parallel_tool_calls: Option<bool>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub function_call: Option<Value>,
    #[serde(default)]
    pub functions: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderedMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Plain text, or multi-part content blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

pub struct PromptRender {
    portkey: Arc<PortkeyConfig>,
}

impl PromptRender {
    #[must_use]
    pub fn new(portkey: Arc<PortkeyConfig>) -> Self {
        Self { portkey }
    }

    async fn run(&self, ctx: &CallContext, raw: &JsonObject) -> Step<String> {
        let args = RenderArgs::from_args(raw).map_err(|e| invalid_input(&e))?;
        let url = endpoint(&self.portkey, &["prompts", &args.endpoint_id(), "render"])?;
        let body = encode_body(&PromptRenderRequest {
            variables: args.variables.clone(),
        })?;

        let response = send(ctx, &self.portkey, Method::POST, url, Some(body)).await?;
        let err_ctx = ErrorContext::prompt(&args.prompt_id, args.prompt_tag.as_deref());
        let body = require_ok(response, &err_ctx)?;

        let rendered: PromptRenderResponse = decode(&body)?;
        if !rendered.success {
            tracing::error!(response = %body, "upstream api returned success:false");
            return Err(failure("upstream service reported failure"));
        }
        Ok(body)
    }
}

#[async_trait]
impl ToolHandler for PromptRender {
    async fn call(&self, ctx: CallContext, args: JsonObject) -> ToolOutcome {
        finish(self.run(&ctx, &args).await)
    }
}

#[must_use]
pub fn descriptor(portkey: Arc<PortkeyConfig>, tool: &ToolConfig) -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        description: tool.description_or(DEFAULT_DESCRIPTION),
        params: params(),
        annotations: read_only_annotations("Render Prompt"),
        handler: Arc::new(PromptRender::new(portkey)),
        enabled: tool.enabled,
    }
}
