use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub client_origin: Option<String>,

    // Backends
    pub llm: Option<LlmConfig>,
    pub catalog: Option<CatalogConfig>,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend to use: "gemini" or "openai"
    pub provider: Option<String>,
    pub base_url: Option<String>,
    /// Model names tried in order.
    pub models: Option<Vec<String>>,
    pub api_key: Option<String>,
    /// Shell command whose stdout is the API key (openai provider only).
    pub api_key_command: Option<String>,
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens per attempt.
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub retry_base_delay_ms: Option<u64>,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub token_url: Option<String>,
    pub api_base: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub primary_market: Option<String>,
    pub secondary_market: Option<String>,
    pub search_markets: Option<Vec<String>>,
    pub desired_count: Option<usize>,
    pub recommendation_limit: Option<u32>,
    pub search_limit: Option<u32>,
    pub timeout_secs: Option<u64>,
}

// Hand-written so a parsed file never prints its secrets.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("api_key", &super::mask_secret(self.api_key.as_deref()))
            .field("api_key_command", &self.api_key_command)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .finish()
    }
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .field("client_id", &super::mask_secret(self.client_id.as_deref()))
            .field(
                "client_secret",
                &super::mask_secret(self.client_secret.as_deref()),
            )
            .field("primary_market", &self.primary_market)
            .field("secondary_market", &self.secondary_market)
            .field("search_markets", &self.search_markets)
            .field("desired_count", &self.desired_count)
            .field("recommendation_limit", &self.recommendation_limit)
            .field("search_limit", &self.search_limit)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
