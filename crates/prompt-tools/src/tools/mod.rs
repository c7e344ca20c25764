//! The Portkey prompt tools.

pub mod prompt_create;
pub mod prompt_render;
pub mod prompts_list;

use std::sync::Arc;

use crate::config::{PortkeyConfig, ToolsConfig};
use crate::tool::ToolDescriptor;

/// Descriptors for every Portkey tool, enabled or not.
#[must_use]
pub fn portkey_tools(portkey: &Arc<PortkeyConfig>, tools: &ToolsConfig) -> Vec<ToolDescriptor> {
    vec![
        prompt_create::descriptor(portkey.clone(), &tools.prompt_create),
        prompt_render::descriptor(portkey.clone(), &tools.prompt_render),
        prompts_list::descriptor(portkey.clone(), &tools.prompts_list),
    ]
}
