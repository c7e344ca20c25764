use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use portkey_prompt_tools::config::DEFAULT_BASE_URL;
use portkey_prompt_tools::{
    HttpClientConfig, MaskedString, PortkeyConfig, ToolConfig, ToolsConfig, Transport,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SSE_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    /// Streamable HTTP on `/mcp`.
    #[value(alias = "http")]
    Sse,
}

impl From<TransportKind> for Transport {
    fn from(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Stdio => Self::Stdio,
            TransportKind::Sse => Self::Sse,
        }
    }
}

/// Every option can also be supplied through the environment (or a `.env` file).
#[derive(Debug, Clone, Parser)]
#[command(name = "portkey-mcp-server", version, about)]
pub struct Cli {
    #[arg(long, env = "PORTKEY_API_KEY", hide_env_values = true)]
    pub portkey_api_key: MaskedString,

    #[arg(long, env = "PORTKEY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub portkey_base_url: String,

    /// Upstream request timeout, e.g. `30s`, `1m30s` or `500ms`.
    #[arg(
        long,
        env = "PORTKEY_CLIENT_TIMEOUT",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub portkey_client_timeout: Duration,

    /// PEM bundle trusted in addition to the built-in roots.
    #[arg(long, env = "PORTKEY_CLIENT_CUSTOM_CA_CERT_PATH")]
    pub portkey_client_custom_ca_cert_path: Option<PathBuf>,

    #[arg(
        long,
        env = "PORTKEY_CLIENT_INSECURE_SKIP_VERIFY",
        default_value_t = false,
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub portkey_client_insecure_skip_verify: bool,

    #[arg(
        long,
        env = "TOOLS_PROMPT_CREATE_ENABLED",
        default_value_t = true,
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub tools_prompt_create_enabled: bool,

    #[arg(long, env = "TOOLS_PROMPT_CREATE_DESCRIPTION")]
    pub tools_prompt_create_description: Option<String>,

    #[arg(
        long,
        env = "TOOLS_PROMPT_RENDER_ENABLED",
        default_value_t = true,
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub tools_prompt_render_enabled: bool,

    #[arg(long, env = "TOOLS_PROMPT_RENDER_DESCRIPTION")]
    pub tools_prompt_render_description: Option<String>,

    #[arg(
        long,
        env = "TOOLS_PROMPTS_LIST_ENABLED",
        default_value_t = true,
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub tools_prompts_list_enabled: bool,

    #[arg(long, env = "TOOLS_PROMPTS_LIST_DESCRIPTION")]
    pub tools_prompts_list_description: Option<String>,

    #[arg(long, env = "LOG_LEVEL", value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, env = "TRANSPORT", value_enum, ignore_case = true, default_value_t = TransportKind::Stdio)]
    pub transport: TransportKind,

    /// Listen address for the HTTP transport.
    #[arg(long, env = "TRANSPORT_SSE_ADDRESS", default_value = DEFAULT_SSE_ADDRESS)]
    pub transport_sse_address: SocketAddr,
}

/// Effective configuration, safe to log.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub log_level: LogLevel,
    pub transport: TransportKind,
    pub transport_sse_address: SocketAddr,
    pub portkey: PortkeyConfig,
    pub tools: ToolsConfig,
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        Self {
            log_level: cli.log_level,
            transport: cli.transport,
            transport_sse_address: cli.transport_sse_address,
            portkey: PortkeyConfig {
                api_key: cli.portkey_api_key,
                base_url: cli.portkey_base_url,
                client: HttpClientConfig {
                    custom_ca_cert_path: cli.portkey_client_custom_ca_cert_path,
                    insecure_skip_verify: cli.portkey_client_insecure_skip_verify,
                    timeout: cli.portkey_client_timeout,
                },
            },
            tools: ToolsConfig {
                prompt_create: tool(
                    cli.tools_prompt_create_enabled,
                    cli.tools_prompt_create_description,
                ),
                prompt_render: tool(
                    cli.tools_prompt_render_enabled,
                    cli.tools_prompt_render_description,
                ),
                prompts_list: tool(
                    cli.tools_prompts_list_enabled,
                    cli.tools_prompts_list_description,
                ),
            },
        }
    }
}

fn tool(enabled: bool, description: Option<String>) -> ToolConfig {
    ToolConfig {
        enabled,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    fn parse(extra: &[&str]) -> AppConfig {
        let mut argv = vec!["portkey-mcp-server", "--portkey-api-key", "pk-test"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).expect("parse").into()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let cfg = parse(&[
            "--portkey-base-url",
            "http://localhost:8787/v1",
            "--portkey-client-timeout",
            "1m30s",
            "--portkey-client-insecure-skip-verify",
            "true",
            "--tools-prompt-create-enabled",
            "false",
            "--tools-prompts-list-description",
            "custom list",
            "--log-level",
            "DEBUG",
            "--transport",
            "http",
            "--transport-sse-address",
            "127.0.0.1:9999",
        ]);
        assert_eq!(cfg.portkey.base_url, "http://localhost:8787/v1");
        assert_eq!(cfg.portkey.client.timeout, Duration::from_secs(90));
        assert!(cfg.portkey.client.insecure_skip_verify);
        assert!(!cfg.tools.prompt_create.enabled);
        assert_eq!(
            cfg.tools.prompts_list.description.as_deref(),
            Some("custom list")
        );
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.transport, TransportKind::Sse);
        assert_eq!(cfg.transport_sse_address.port(), 9999);
    }

    #[test]
    fn boolish_values_are_accepted() {
        for (raw, expected) in [("1", true), ("yes", true), ("0", false), ("off", false)] {
            let cfg = parse(&["--tools-prompt-render-enabled", raw]);
            assert_eq!(cfg.tools.prompt_render.enabled, expected, "{raw}");
        }
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let err = Cli::try_parse_from([
            "portkey-mcp-server",
            "--portkey-api-key",
            "pk-test",
            "--transport",
            "websocket",
        ])
        .expect_err("invalid transport");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn logged_config_masks_the_api_key() {
        let cfg = parse(&[]);
        let logged = serde_json::to_string(&cfg).expect("json");
        assert!(!logged.contains("pk-test"));
        assert!(logged.contains("\"api_key\":\"****\""));
    }

    #[test]
    fn transport_kind_maps_to_server_transport() {
        assert_eq!(Transport::from(TransportKind::Stdio), Transport::Stdio);
        assert_eq!(Transport::from(TransportKind::Sse), Transport::Sse);
    }

    #[test]
    fn timeout_uses_duration_notation() {
        assert_eq!(parse(&[]).portkey.client.timeout, Duration::from_secs(30));
        let cfg = parse(&["--portkey-client-timeout", "500ms"]);
        assert_eq!(cfg.portkey.client.timeout, Duration::from_millis(500));

        let err = Cli::try_parse_from([
            "portkey-mcp-server",
            "--portkey-api-key",
            "pk-test",
            "--portkey-client-timeout",
            "30",
        ])
        .expect_err("unit is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
