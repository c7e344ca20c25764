//! Registration of enabled tools and dispatch of calls to their wrapped handlers.

use rmcp::model::{JsonObject, Tool};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{PortkeyConfig, ToolsConfig};
use crate::context::CallContext;
use crate::error::{SetupError, ToolError};
use crate::middleware::{Interceptor, ToolHandler, ToolOutcome, chain, default_interceptors};
use crate::tool::ToolDescriptor;
use crate::tools::portkey_tools;

struct Registered {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

/// Enabled tools in registration order, each behind the interceptor chain.
pub struct ToolRegistry {
    tools: Vec<Registered>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Names must be unique across all descriptors, including disabled ones.
    pub fn new(
        descriptors: Vec<ToolDescriptor>,
        interceptors: &[Arc<dyn Interceptor>],
    ) -> Result<Self, ToolError> {
        let mut seen = HashSet::new();
        if let Some(dup) = descriptors.iter().find(|d| !seen.insert(d.name)) {
            return Err(ToolError::DuplicateTool(dup.name.to_string()));
        }

        let mut tools = Vec::new();
        let mut by_name = HashMap::new();
        for descriptor in descriptors.into_iter().filter(|d| d.enabled) {
            tracing::info!("registering {} tool", descriptor.name);
            by_name.insert(descriptor.name, tools.len());
            tools.push(Registered {
                tool: descriptor.to_mcp_tool(),
                handler: chain(descriptor.handler.clone(), interceptors),
            });
        }

        Ok(Self { tools, by_name })
    }

    /// Validate the upstream config, build the shared client and register the Portkey tools with
    /// the default interceptors.
    pub fn from_config(portkey: PortkeyConfig, tools: &ToolsConfig) -> Result<Self, SetupError> {
        portkey.validate()?;
        let client = portkey.client.build_client()?;
        let portkey = Arc::new(portkey);
        let registry = Self::new(
            portkey_tools(&portkey, tools),
            &default_interceptors(client),
        )?;
        Ok(registry)
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.tool.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn call(&self, name: &str, ctx: CallContext, args: JsonObject) -> ToolOutcome {
        let Some(&index) = self.by_name.get(name) else {
            return Err(ToolError::UnknownTool(name.to_string()));
        };
        self.tools[index].handler.call(ctx, args).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}
