//! Application configuration management
//!
//! Configuration comes from environment variables (a `.env` file is loaded
//! by `main` beforehand) and optionally from a TOML file. Environment values
//! override file values. Everything is validated before the first request.

use crate::core::constants::{defaults, path};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Message shown when the endpoint or key is missing
pub const MISSING_CREDENTIALS: &str =
    "Set AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY in your .env file.";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AzureSection {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub deployment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RequestSection {
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub azure: AzureSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub request: RequestSection,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint exactly as configured (resource or project URL)
    pub endpoint: String,

    /// Azure OpenAI API key
    pub api_key: String,

    /// Deployment name sent as the `model` field
    pub deployment: String,

    /// Resource-level v1 base URL, always ending in `/`
    pub base_url: String,

    /// Logging level
    pub log_level: String,

    /// Request timeout in seconds
    pub request_timeout: u64,
}

/// Derive the resource-level v1 base URL from a resource or project endpoint
///
/// `https://r.services.ai.azure.com/api/projects/p` becomes
/// `https://r.services.ai.azure.com/openai/v1/`.
pub fn base_url_from_endpoint(endpoint: &str) -> String {
    let resource = match endpoint.find(path::PROJECTS_SEGMENT) {
        Some(idx) => &endpoint[..idx],
        None => endpoint,
    };
    format!("{}{}", resource.trim_end_matches('/'), path::OPENAI_V1)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from a TOML file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if the
    /// resolved configuration is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read configuration file")?;
        let file: TomlConfig =
            toml::from_str(&content).context("Failed to parse TOML configuration")?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Load configuration from the environment
    ///
    /// Reads the TOML file named by `CONFIG_PATH` first when that is set.
    pub fn from_env() -> Result<Self> {
        match std::env::var("CONFIG_PATH") {
            Ok(config_path) => Self::from_file(config_path),
            Err(_) => Self::from_sources(TomlConfig::default(), |key| std::env::var(key).ok()),
        }
    }

    /// Merge file values with environment lookups and validate the result
    pub fn from_sources<F>(file: TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = non_empty(env("AZURE_OPENAI_ENDPOINT")).or(non_empty(file.azure.endpoint));
        let api_key = non_empty(env("AZURE_OPENAI_API_KEY")).or(non_empty(file.azure.api_key));

        let (Some(endpoint), Some(api_key)) = (endpoint, api_key) else {
            bail!(MISSING_CREDENTIALS);
        };

        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            bail!("AZURE_OPENAI_ENDPOINT must be an http(s) URL, got '{}'", endpoint);
        }

        let deployment = non_empty(env("AZURE_OPENAI_DEPLOYMENT"))
            .or(non_empty(file.azure.deployment))
            .unwrap_or_else(|| defaults::DEPLOYMENT.to_string());

        let log_level = non_empty(env("LOG_LEVEL"))
            .or(non_empty(file.logging.level))
            .unwrap_or_else(|| defaults::LOG_LEVEL.to_string());

        let request_timeout = match non_empty(env("REQUEST_TIMEOUT")) {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("REQUEST_TIMEOUT must be a number of seconds, got '{}'", raw))?,
            None => file.request.timeout.unwrap_or(defaults::REQUEST_TIMEOUT),
        };

        if request_timeout == 0 {
            bail!("Request timeout must be greater than zero");
        }

        Ok(Config {
            base_url: base_url_from_endpoint(&endpoint),
            endpoint,
            api_key,
            deployment,
            log_level,
            request_timeout,
        })
    }
}
