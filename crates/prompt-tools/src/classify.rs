//! Translation of non-200 upstream responses into caller-safe tool errors.
//!
//! This is the only place that decides what a status code means. Handlers hand over the status
//! and body; the classifier logs the details at the category's level and returns a generic
//! message for the caller. Raw upstream bodies never reach the caller.

use rmcp::model::{CallToolResult, Content};

/// Longest upstream body (in bytes) copied into a log record.
pub const MAX_LOGGED_BODY_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    ClientError,
    ServerError,
    Unknown,
}

impl UpstreamErrorKind {
    /// Total over every status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Whether this category indicates an operational problem rather than expected traffic.
    #[must_use]
    pub fn is_fault(self) -> bool {
        !matches!(self, Self::NotFound | Self::ClientError)
    }

    fn log_message(self, resource: &str) -> String {
        match self {
            Self::Unauthorized => "unauthorized access to upstream service".to_string(),
            Self::Forbidden => "forbidden access to upstream service".to_string(),
            Self::NotFound => format!("{resource} not found"),
            Self::ClientError => "invalid request to upstream service".to_string(),
            Self::ServerError => "upstream service error".to_string(),
            Self::Unknown => "unexpected status code from upstream service".to_string(),
        }
    }

    fn user_message(self, resource: &str) -> String {
        match self {
            Self::Unauthorized => "unauthorized access to upstream service".to_string(),
            Self::Forbidden => "forbidden access to upstream service".to_string(),
            Self::NotFound => format!("requested {resource} not found"),
            Self::ClientError => "invalid request to upstream service".to_string(),
            Self::ServerError => "upstream service reported an error".to_string(),
            Self::Unknown => "unexpected response from upstream service".to_string(),
        }
    }
}

/// Tool-specific identification attached to classifier log records.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Noun used in the not-found message, e.g. "prompt".
    pub resource: &'static str,
    pub prompt_id: Option<String>,
    pub prompt_tag: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn resource(resource: &'static str) -> Self {
        Self {
            resource,
            prompt_id: None,
            prompt_tag: None,
        }
    }

    #[must_use]
    pub fn prompt(prompt_id: &str, prompt_tag: Option<&str>) -> Self {
        Self {
            resource: "prompt",
            prompt_id: Some(prompt_id.to_string()),
            prompt_tag: Some(prompt_tag.unwrap_or_default().to_string()),
        }
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::resource("resource")
    }
}

/// Outcome of classifying one upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: UpstreamErrorKind,
    pub status: u16,
    /// Caller-visible text.
    pub message: String,
    /// Log-only text.
    pub log_message: String,
    /// Upstream body, truncated to [`MAX_LOGGED_BODY_BYTES`].
    pub detail: String,
}

impl ClassifiedError {
    #[must_use]
    pub fn into_result(self) -> CallToolResult {
        CallToolResult::error(vec![Content::text(self.message)])
    }
}

/// Classify without logging.
#[must_use]
pub fn classify(status: u16, body: &str, ctx: &ErrorContext) -> ClassifiedError {
    let kind = UpstreamErrorKind::from_status(status);
    ClassifiedError {
        kind,
        status,
        message: kind.user_message(ctx.resource),
        log_message: kind.log_message(ctx.resource),
        detail: truncate(body, MAX_LOGGED_BODY_BYTES).to_string(),
    }
}

/// Classify, emit the log record, and build the caller-visible error result.
#[must_use]
pub fn handle_upstream_error(status: u16, body: &str, ctx: &ErrorContext) -> CallToolResult {
    let classified = classify(status, body, ctx);
    let prompt_id = ctx.prompt_id.as_deref();
    let prompt_tag = ctx.prompt_tag.as_deref();

    if classified.kind.is_fault() {
        tracing::error!(
            status_code = classified.status,
            response = %classified.detail,
            prompt_id,
            prompt_tag,
            "{}",
            classified.log_message
        );
    } else {
        tracing::info!(
            status_code = classified.status,
            response = %classified.detail,
            prompt_id,
            prompt_tag,
            "{}",
            classified.log_message
        );
    }

    classified.into_result()
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
