//! `prompts_list`: list prompt metadata, with optional filters and paging.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use rmcp::model::JsonObject;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::args::{ArgResult, Args};
use crate::classify::ErrorContext;
use crate::config::{PortkeyConfig, ToolConfig};
use crate::context::CallContext;
use crate::middleware::{ToolHandler, ToolOutcome};
use crate::semantics::annotations_for_method;
use crate::tool::{ParamKind, ParamSpec, ToolDescriptor};
use crate::upstream::{
    Step, decode, endpoint, finish, invalid_input, null_as_default, require_ok, send,
};

pub const NAME: &str = "prompts_list";

const DEFAULT_DESCRIPTION: &str = "List all prompts in your Portkey account after applying the \
provided arguments. This tool allows you to retrieve prompt metadata like prompt ID, prompt slug, \
name, collection, model, and status. You can filter by various parameters and paginate results. \
There is the ability to search by approximate name and slug matches.";

fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::optional(
            "collection_id",
            ParamKind::String,
            "Optional. Filter prompts by collection ID.",
        ),
        ParamSpec::optional(
            "workspace_id",
            ParamKind::String,
            "Optional. Filter prompts by workspace ID.",
        ),
        ParamSpec::optional(
            "current_page",
            ParamKind::Number,
            "Optional. Page number for pagination. Starts at 1.",
        ),
        ParamSpec::optional(
            "page_size",
            ParamKind::Number,
            "Optional. Number of results per page.",
        ),
        ParamSpec::optional(
            "search",
            ParamKind::String,
            "Optional. Search term to filter prompts by name or slug.",
        ),
    ]
}

/// Query filters for `GET /prompts`. `None` filters are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub collection_id: Option<String>,
    pub workspace_id: Option<String>,
    pub current_page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

impl ListFilters {
    pub fn from_args(raw: &JsonObject) -> ArgResult<Self> {
        let args = Args::new(raw);
        Ok(Self {
            collection_id: args.optional_str("collection_id")?,
            workspace_id: args.optional_str("workspace_id")?,
            current_page: args.optional_positive_int("current_page")?,
            page_size: args.optional_positive_int("page_size")?,
            search: args.optional_str("search")?,
        })
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("collection_id", self.collection_id.clone()),
            ("workspace_id", self.workspace_id.clone()),
            ("current_page", self.current_page.map(|n| n.to_string())),
            ("page_size", self.page_size.map(|n| n.to_string())),
            ("search", self.search.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    pub fn apply(&self, url: &mut Url) {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(pairs);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptsListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<PromptSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub object: Option<String>,
}

pub struct PromptsList {
    portkey: Arc<PortkeyConfig>,
}

impl PromptsList {
    #[must_use]
    pub fn new(portkey: Arc<PortkeyConfig>) -> Self {
        Self { portkey }
    }

    async fn run(&self, ctx: &CallContext, raw: &JsonObject) -> Step<String> {
        let filters = ListFilters::from_args(raw).map_err(|e| invalid_input(&e))?;
        let mut url = endpoint(&self.portkey, &["prompts"])?;
        filters.apply(&mut url);

        let response = send(ctx, &self.portkey, Method::GET, url, None).await?;
        let body = require_ok(response, &ErrorContext::default())?;
        decode::<PromptsListResponse>(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl ToolHandler for PromptsList {
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
        annotations: annotations_for_method(&Method::GET, "List Prompts"),
        handler: Arc::new(PromptsList::new(portkey)),
        enabled: tool.enabled,
    }
}
