use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::secrets::{self, DEFAULT_API_KEY_ENV_VAR};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default = "default_progress_channel_capacity")]
    pub progress_channel_capacity: usize,
}

fn default_progress_channel_capacity() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            gemini: GeminiConfig::default(),
            export: ExportConfig::default(),
            progress_channel_capacity: default_progress_channel_capacity(),
        }
    }
}

impl Config {
    /// Resolves the Gemini credential. A missing key is fatal for every
    /// remote call, so callers check this once before building a client.
    pub fn resolve_api_key(&self) -> Result<SecretString, ConfigError> {
        secrets::resolve_secret(
            self.gemini.api_key.as_deref(),
            self.gemini.api_key_file.as_deref(),
            self.gemini.api_key_env_var.as_deref(),
        )
        .map_err(ConfigError::MissingApiKey)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env_var() -> Option<String> {
    Some(DEFAULT_API_KEY_ENV_VAR.to_string())
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// Search-grounded generation routinely takes tens of seconds.
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_filename")]
    pub filename: String,
}

fn default_export_filename() -> String {
    "anime_data.csv".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: default_export_filename(),
        }
    }
}
