//! Portkey prompt management exposed as MCP tools.
//!
//! Used by `portkey-mcp-server`, which owns process concerns (CLI, log sink, transports). This
//! crate owns the request pipeline: interceptor chain, argument validation, upstream calls and
//! upstream error classification.

pub mod args;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod redact;
pub mod registry;
pub mod secret;
pub mod semantics;
pub mod server;
pub mod tool;
pub mod tools;
pub mod upstream;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{HttpClientConfig, PortkeyConfig, ToolConfig, ToolsConfig};
pub use error::{ConfigError, SetupError, ToolError};
pub use registry::ToolRegistry;
pub use secret::{MaskedString, MostlyMaskedString};
pub use server::{PeerAddr, PromptToolsServer, Transport};
