use std::path::PathBuf;
use thiserror::Error;

/// Invalid upstream or HTTP client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("portkey base url is required")]
    MissingBaseUrl,
    #[error("invalid portkey base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("portkey base url must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("portkey base url '{0}' cannot carry path segments")]
    CannotBeABase(String),
    #[error("portkey api key is required")]
    MissingApiKey,
    #[error("http client timeout must be greater than zero")]
    ZeroTimeout,
    #[error("custom CA certificate '{0}' does not exist")]
    CaCertNotFound(PathBuf),
    #[error("failed to read custom CA certificate '{path}': {source}")]
    CaCertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid custom CA certificate '{path}': {source}")]
    CaCertParse {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
    #[error("custom CA certificate '{0}' contains no PEM certificates")]
    CaCertEmpty(PathBuf),
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Failures that escape the tool pipeline instead of becoming an error result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool call was cancelled")]
    Cancelled,
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("tool '{0}' is registered more than once")]
    DuplicateTool(String),
}

/// Startup failure while assembling the tool registry.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Register(#[from] ToolError),
}
