//! `prompt_create`: create a prompt template in a Portkey collection.

use async_trait::async_trait;
use reqwest::Method;
use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::args::{ArgResult, Args};
use crate::classify::ErrorContext;
use crate::config::{PortkeyConfig, ToolConfig};
use crate::context::CallContext;
use crate::middleware::{ToolHandler, ToolOutcome};
use crate::semantics::annotations_for_method;
use crate::tool::{ParamKind, ParamSpec, ToolDescriptor};
use crate::upstream::{Step, decode, encode_body, endpoint, finish, invalid_input, require_ok, send};

pub const NAME: &str = "prompt_create";

const DEFAULT_DESCRIPTION: &str = "Create a new prompt in your Portkey account with the provided \
arguments. This tool allows you to create a prompt with a name, template string, parameters, and \
other optional settings.";

fn params() -> Vec<ParamSpec> {
    use ParamKind::{Object, ObjectArray, String};
    vec![
        ParamSpec::required("name", String, "Name of the prompt to create."),
        ParamSpec::required(
            "collection_id",
            String,
            "UUID or slug of the collection to add the prompt to.",
        ),
        ParamSpec::required(
            "string",
            String,
            "Prompt template in string format. Use {{variable_name}} syntax to define variables \
             that can be substituted at runtime (e.g., 'Hello {{name}}, how are you?').",
        ),
        ParamSpec::required(
            "parameters",
            Object,
            "Parameters for the prompt. This defines the variable schema for the template. Each \
             key in this object will be available as {{key}} in the prompt template. Uses \
             Mustache templating - keys should be the variable names with values as expected \
             data types (e.g., {\"name\": \"string\", \"age\": \"number\"}). At runtime, users \
             will provide actual values for these variables.",
        ),
        ParamSpec::optional("functions", ObjectArray, "Functions for the prompt."),
        ParamSpec::optional("tools", ObjectArray, "Tools for the prompt."),
        ParamSpec::optional("tool_choice", Object, "Tool Choice for the prompt."),
        ParamSpec::optional("model", String, "The model to use for the prompt."),
        ParamSpec::optional("virtual_key", String, "The virtual key to use for the prompt."),
        ParamSpec::optional(
            "version_description",
            String,
            "The description of the prompt version.",
        ),
        ParamSpec::optional("template_metadata", Object, "Metadata for the prompt."),
    ]
}

/// Body of `POST /prompts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptCreateRequest {
    pub name: String,
    pub collection_id: String,
    pub string: String,
    pub parameters: JsonObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<JsonObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<JsonObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_metadata: Option<JsonObject>,
}

impl PromptCreateRequest {
    /// Validate caller arguments. Fails on the first missing or malformed field.
    pub fn from_args(raw: &JsonObject) -> ArgResult<Self> {
        let args = Args::new(raw);
        Ok(Self {
            name: args.required_str("name")?,
            collection_id: args.required_str("collection_id")?,
            string: args.required_str("string")?,
            parameters: args.required_object("parameters")?,
            functions: args.optional_object_array("functions")?,
            tools: args.optional_object_array("tools")?,
            tool_choice: args.optional_object("tool_choice")?,
            model: args.optional_str("model")?,
            virtual_key: args.optional_str("virtual_key")?,
            version_description: args.optional_str("version_description")?,
            template_metadata: args.optional_object("template_metadata")?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptCreateResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
}

pub struct PromptCreate {
    portkey: Arc<PortkeyConfig>,
}

impl PromptCreate {
    #[must_use]
    pub fn new(portkey: Arc<PortkeyConfig>) -> Self {
        Self { portkey }
    }

    async fn run(&self, ctx: &CallContext, raw: &JsonObject) -> Step<String> {
        let request = PromptCreateRequest::from_args(raw).map_err(|e| invalid_input(&e))?;
        let body = encode_body(&request)?;
        let url = endpoint(&self.portkey, &["prompts"])?;

        let response = send(ctx, &self.portkey, Method::POST, url, Some(body)).await?;
        let body = require_ok(response, &ErrorContext::default())?;
        decode::<PromptCreateResponse>(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl ToolHandler for PromptCreate {
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
        annotations: annotations_for_method(&Method::POST, "Create Prompt"),
        handler: Arc::new(PromptCreate::new(portkey)),
        enabled: tool.enabled,
    }
}
