//! Client configuration shared by Trek front-ends.
//!
//! Resolves the remote API base URL from explicit values, the environment,
//! and stored profile settings, in that order.

use serde::{Deserialize, Serialize};

/// Environment variable overriding the configured API base URL.
pub const API_URL_ENV: &str = "TREK_API_URL";

/// Endpoint configuration for one Trek backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl ClientConfig {
    /// Validated API base URL, if configured.
    pub fn api_base_url(&self) -> Result<Option<String>, String> {
        normalize_text_option(self.api_base_url.clone())
            .map(|url| normalize_api_url(&url))
            .transpose()
    }

    /// Pick the first configured URL: explicit, then `TREK_API_URL`, then `self`.
    pub fn resolve_api_base_url(&self, explicit: Option<String>) -> Result<Option<String>, String> {
        let env_value = std::env::var(API_URL_ENV).ok();
        let chosen = normalize_text_option(explicit)
            .or_else(|| normalize_text_option(env_value))
            .or_else(|| normalize_text_option(self.api_base_url.clone()));
        chosen.map(|url| normalize_api_url(&url)).transpose()
    }
}

/// Trimmed text, or `None` when nothing but whitespace is left.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Trim, require an http(s) scheme, and drop trailing slashes.
pub fn normalize_api_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("API URL must not be empty".to_string());
    }
    if !["http://", "https://"]
        .iter()
        .any(|scheme| trimmed.starts_with(scheme))
    {
        return Err("API URL must include http:// or https://".to_string());
    }
    Ok(trimmed.to_string())
}
