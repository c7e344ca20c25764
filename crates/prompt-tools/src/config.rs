//! Upstream (Portkey API) and per-tool configuration.
//!
//! Values arrive already parsed from the host process; this module validates them and builds the
//! shared HTTP client.

use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::secret::MaskedString;

pub const DEFAULT_BASE_URL: &str = "https://api.portkey.ai/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct PortkeyConfig {
    pub api_key: MaskedString,
    pub base_url: String,
    pub client: HttpClientConfig,
}

impl PortkeyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        self.client.validate()
    }

    fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase(raw.to_string()));
        }
        Ok(url)
    }

    /// `{base_url}/{segments..}`, each segment percent-encoded as a single path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ConfigError> {
        let mut url = self.parsed_base_url()?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ConfigError::CannotBeABase(self.base_url.clone()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HttpClientConfig {
    pub custom_ca_cert_path: Option<PathBuf>,
    pub insecure_skip_verify: bool,
    #[serde(serialize_with = "serialize_duration")]
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            custom_ca_cert_path: None,
            insecure_skip_verify: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Logged in the same notation it is configured in, e.g. `30s`.
fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*value))
}

impl HttpClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.custom_ca_cert_path
            && !path.exists()
        {
            return Err(ConfigError::CaCertNotFound(path.clone()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Build the client shared by every tool call. System roots are always trusted; a custom CA
    /// bundle is added on top.
    pub fn build_client(&self) -> Result<reqwest::Client, ConfigError> {
        self.validate()?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.timeout);

        if let Some(path) = &self.custom_ca_cert_path {
            let pem = std::fs::read(path).map_err(|source| ConfigError::CaCertRead {
                path: path.clone(),
                source,
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|source| {
                ConfigError::CaCertParse {
                    path: path.clone(),
                    source,
                }
            })?;
            if certs.is_empty() {
                return Err(ConfigError::CaCertEmpty(path.clone()));
            }
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if self.insecure_skip_verify {
            tracing::warn!("TLS certificate verification is disabled for upstream requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(ConfigError::ClientBuild)
    }
}

/// Enable flag and description override for one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolConfig {
    pub enabled: bool,
    pub description: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            description: None,
        }
    }
}

impl ToolConfig {
    /// The override when set and non-blank, otherwise `default`.
    #[must_use]
    pub fn description_or(&self, default: &str) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => default.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolsConfig {
    pub prompt_create: ToolConfig,
    pub prompt_render: ToolConfig,
    pub prompts_list: ToolConfig,
}
