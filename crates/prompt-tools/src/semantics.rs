//! MCP tool annotations derived from the HTTP method a tool issues upstream.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Hints for a tool that performs a single `method` request against the Portkey API.
///
/// `openWorldHint` is always set: every tool talks to an external service. Methods other than
/// the safe ones and `POST` only get that hint.
#[must_use]
pub fn annotations_for_method(method: &Method, title: &str) -> ToolAnnotations {
    let annotations = ToolAnnotations::with_title(title).open_world(true);

    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return annotations
            .read_only(true)
            .destructive(false)
            .idempotent(true);
    }

    if method == Method::POST {
        return annotations
            .read_only(false)
            .destructive(false)
            .idempotent(false);
    }

    annotations
}

/// Render is a `POST` upstream but only reads a template, so it is annotated as a safe read.
#[must_use]
pub fn read_only_annotations(title: &str) -> ToolAnnotations {
    annotations_for_method(&Method::GET, title)
}
