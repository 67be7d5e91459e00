//! Application configuration management
//!
//! This module handles loading and validating configuration from TOML files.
//! All configuration is validated at startup so the service fails fast when
//! misconfigured.

use crate::core::provider::ProviderType;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default upper bound on completion tokens — artifacts are whole components
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default request timeout in seconds; streams stay open for a while
const DEFAULT_REQUEST_TIMEOUT: u64 = 300;

/// Default server port
const DEFAULT_PORT: u16 = 8090;

const DEFAULT_MAX_MESSAGES: u32 = 30;

/// Model the original service generates artifacts with
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
}

/// Grist instance used to validate client access tokens
#[derive(Debug, Clone, Deserialize)]
pub struct GristConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RequestConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_messages")]
    pub max_messages_limit: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_max_messages() -> u32 {
    DEFAULT_MAX_MESSAGES
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub provider: String,
    #[serde(default)]
    pub anthropic: Option<AnthropicConfig>,
    #[serde(default)]
    pub openrouter: Option<OpenRouterConfig>,
    #[serde(default)]
    pub grist: Option<GristConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

/// Application configuration loaded from TOML files
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream provider type (Anthropic or OpenRouter)
    pub provider: ProviderType,

    /// API key for the selected provider
    pub api_key: String,

    /// Base URL for the selected provider's API
    pub api_base_url: String,

    /// Model name to request completions from
    pub model: String,

    /// OpenRouter specific settings
    pub openrouter_site_url: Option<String>,
    pub openrouter_app_name: Option<String>,

    /// Grist instance for access-token validation; when unset, token
    /// validation is skipped
    pub grist_base_url: Option<String>,

    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Logging level
    pub log_level: String,

    /// Maximum completion tokens requested upstream
    pub max_tokens: u32,

    /// Message limit for context truncation
    pub max_messages_limit: u32,

    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The TOML file cannot be read or parsed
    /// - Required configuration values are missing
    /// - Configuration values are invalid
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read configuration file")?;

        let config: TomlConfig =
            toml::from_str(&content).context("Failed to parse TOML configuration")?;

        let provider = ProviderType::from_str(&config.provider)
            .context("Invalid provider value. Must be one of: anthropic, openrouter")?;

        let (api_key, api_base_url, model, openrouter_site_url, openrouter_app_name) =
            match provider {
                ProviderType::Anthropic => {
                    let anthropic_config = config
                        .anthropic
                        .context("Anthropic configuration missing for Anthropic provider")?;
                    (
                        anthropic_config.api_key,
                        anthropic_config
                            .base_url
                            .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
                        anthropic_config
                            .model
                            .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                        None,
                        None,
                    )
                }
                ProviderType::OpenRouter => {
                    let openrouter_config = config
                        .openrouter
                        .context("OpenRouter configuration missing for OpenRouter provider")?;
                    (
                        openrouter_config.api_key,
                        openrouter_config
                            .base_url
                            .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
                        openrouter_config.model,
                        openrouter_config.site_url,
                        openrouter_config.app_name,
                    )
                }
            };

        Ok(Config {
            provider,
            api_key,
            api_base_url,
            model,
            openrouter_site_url,
            openrouter_app_name,
            grist_base_url: config.grist.map(|g| g.base_url),
            host: config.server.host,
            port: config.server.port,
            log_level: config.server.log_level,
            max_tokens: config.request.max_tokens,
            max_messages_limit: config.request.max_messages_limit,
            request_timeout: config.request.request_timeout,
        })
    }

    /// Load configuration from environment and config file
    ///
    /// Looks for config.toml in current directory by default
    pub fn from_env() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::from_file(config_path)
    }

    /// Validate API key format based on provider
    ///
    /// For Anthropic: checks that the API key starts with 'sk-ant-' prefix
    /// For OpenRouter: checks that the key is non-empty
    pub fn validate_api_key(&self) -> bool {
        match self.provider {
            ProviderType::Anthropic => {
                !self.api_key.is_empty() && self.api_key.starts_with("sk-ant-")
            }
            ProviderType::OpenRouter => !self.api_key.is_empty(),
        }
    }
}
