//! Tool descriptors: the advertised MCP schema paired with the handler that serves it.

use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

use crate::middleware::ToolHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Object,
    /// Object whose values are strings.
    StringMap,
    /// Array of objects.
    ObjectArray,
}

impl ParamKind {
    fn schema(self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Number => json!({"type": "number"}),
            Self::Object => json!({"type": "object"}),
            Self::StringMap => json!({
                "type": "object",
                "additionalProperties": {"type": "string"}
            }),
            Self::ObjectArray => json!({
                "type": "array",
                "items": {"type": "object"}
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    #[must_use]
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// One registrable tool. Names must be unique within a registry.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub annotations: ToolAnnotations,
    pub handler: Arc<dyn ToolHandler>,
    pub enabled: bool,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// JSON Schema for the tool's arguments.
    #[must_use]
    pub fn input_schema(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        let mut required: Vec<&str> = Vec::new();

        for param in &self.params {
            let mut prop = param.kind.schema();
            prop["description"] = json!(param.description);
            properties.insert(param.name.to_string(), prop);
            if param.required {
                required.push(param.name);
            }
        }

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema
    }

    #[must_use]
    pub fn to_mcp_tool(&self) -> Tool {
        let mut tool = Tool::new(
            self.name,
            self.description.clone(),
            Arc::new(self.input_schema()),
        );
        tool.annotations = Some(self.annotations.clone());
        tool
    }
}
