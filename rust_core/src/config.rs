// rust_core/src/config.rs
// Backend settings, read from the environment.
// Keys are required; everything else has a sensible default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_REPLICATE_MODEL: &str = "ideogram-ai/ideogram-v2";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBackendConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBackendConfig {
    pub api_key: String,
    pub base_url: String,
    /// `owner/name` of the hosted model.
    pub model: String,
    /// Download URL outputs and embed them as data URIs.
    #[serde(default)]
    pub inline_images: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub text: TextBackendConfig,
    pub image: ImageBackendConfig,
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl GeneratorConfig {
    /// Reads `OPENAI_API_KEY`, `REPLICATE_API_KEY` and the optional overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, against any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVar(name));

        let inline_images = match get("MEME_CARD_INLINE_IMAGES") {
            None => false,
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid {
                name: "MEME_CARD_INLINE_IMAGES",
                value: v,
            })?,
        };

        let http_timeout_secs = match get("MEME_CARD_HTTP_TIMEOUT_SECS") {
            None => DEFAULT_HTTP_TIMEOUT_SECS,
            Some(v) => v.parse::<u64>().ok().filter(|s| *s > 0).ok_or(ConfigError::Invalid {
                name: "MEME_CARD_HTTP_TIMEOUT_SECS",
                value: v,
            })?,
        };

        Ok(Self {
            text: TextBackendConfig {
                api_key: require("OPENAI_API_KEY")?,
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            image: ImageBackendConfig {
                api_key: require("REPLICATE_API_KEY")?,
                base_url: get("REPLICATE_BASE_URL").unwrap_or_else(|| DEFAULT_REPLICATE_BASE_URL.to_string()),
                model: get("REPLICATE_MODEL").unwrap_or_else(|| DEFAULT_REPLICATE_MODEL.to_string()),
                inline_images,
            },
            http_timeout_secs,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
