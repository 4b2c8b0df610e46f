//! Configuration management with serde serialization/deserialization
//!
//! This module provides the configuration structures shared by every tool:
//! HTTP client settings, the optional CORS proxy, password defaults and the
//! location of the password history file.

use crate::password::PasswordOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the toolkit
///
/// # Examples
///
/// ```rust
/// use wp_toolkit::Config;
///
/// // Use default configuration
/// let config = Config::default();
///
/// // Route HTML fetches for the SEO analyzer through a proxy
/// let config = Config {
///     proxy_endpoint: Some("https://api.allorigins.win/get".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// User-Agent header sent with every fetch (default: crate name and version)
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds (default: none)
    ///
    /// Fetches are unbounded unless this is set; a hung server stalls the
    /// invoking tool until the connection drops.
    pub request_timeout_secs: Option<u64>,

    /// CORS-proxy endpoint returning `{ "contents": "<html>" }` (default: none)
    ///
    /// When set, the HTML variant of the SEO analyzer fetches pages through
    /// `<endpoint>?url=<encoded target>` instead of requesting them directly.
    pub proxy_endpoint: Option<String>,

    /// Password history file (default: `$HOME/.config/wp-toolkit/passwords.json`)
    pub history_path: Option<PathBuf>,

    /// Record generated passwords in the history file (default: true)
    pub save_history: bool,

    /// Default options for the password generator
    pub password: PasswordOptions,

    /// Target format for the image converter (default: WebP)
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: None,
            request_timeout_secs: None,
            proxy_endpoint: None,
            history_path: None,
            save_history: true,
            password: PasswordOptions::default(),
            output_format: OutputFormat::Webp,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("wp-toolkit/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Resolves the history file, falling back to the per-user config directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.history_path {
            return Some(path.clone());
        }
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("wp-toolkit")
                .join("passwords.json")
        })
    }
}

/// Supported output image formats for the converter
///
/// - WebP: lossy at quality 0.9, the default target
/// - JPEG: lossy at quality 0.9
/// - PNG: lossless, quality is ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::Webp),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(crate::ToolError::InvalidInput(format!(
                "unsupported output format '{other}' (expected webp, jpeg or png)"
            ))),
        }
    }
}

/// One user action against a tool: the raw text or file path as entered.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub id: String,
    pub raw_input: String,
}

impl ToolRequest {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            ..Default::default()
        }
    }
}

impl Default for ToolRequest {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            raw_input: String::new(),
        }
    }
}

pub fn validate_config(config: &Config) -> Result<(), crate::ToolError> {
    use crate::ToolError;

    if config.request_timeout_secs == Some(0) {
        return Err(ToolError::ConfigurationError(
            "request timeout must be greater than 0".to_string(),
        ));
    }

    if let Some(endpoint) = &config.proxy_endpoint {
        crate::validate_url(endpoint).map_err(|e| {
            ToolError::ConfigurationError(format!("invalid proxy endpoint '{endpoint}': {e}"))
        })?;
    }

    config
        .password
        .validate()
        .map_err(|e| ToolError::ConfigurationError(e.to_string()))?;

    Ok(())
}
