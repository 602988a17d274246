mod file_config;

pub use file_config::{CatalogConfig, FileConfig, LlmConfig};

use crate::server::RequestsLoggingLevel;
use crate::tracks::{SPOTIFY_API_BASE, SPOTIFY_TOKEN_URL};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_GEMINI_MODELS: [&str; 2] = ["gemini-1.5-flash", "gemini-1.5-flash-8b"];
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;

/// Accepted by the catalog's recommendations endpoint.
const RECOMMENDATION_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
/// Accepted by the catalog's search endpoint.
const SEARCH_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

/// Presence-only rendering of a secret: `set(len=N)` or `missing/empty`.
pub fn mask_secret(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("set(len={})", v.len()),
        _ => "missing/empty".to_string(),
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub client_origin: Option<String>,
    pub gemini_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub client_origin: String,
    /// Whether the origin was configured explicitly rather than defaulted.
    pub client_origin_configured: bool,

    pub llm: LlmSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    OpenAi,
}

impl LlmProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub models: Vec<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    pub retry_base_delay: Duration,
}

impl LlmSettings {
    /// Whether a key (or a way to obtain one) is available.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty()) || self.api_key_command.is_some()
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("api_key", &mask_secret(self.api_key.as_deref()))
            .field("api_key_command", &self.api_key_command)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout", &self.timeout)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish()
    }
}

#[derive(Clone)]
pub struct CatalogSettings {
    pub token_url: String,
    pub api_base: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub primary_market: String,
    pub secondary_market: Option<String>,
    pub search_markets: Vec<String>,
    pub desired_count: usize,
    pub recommendation_limit: u32,
    pub search_limit: u32,
    pub timeout: Duration,
}

impl CatalogSettings {
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.client_id) && present(&self.client_secret)
    }
}

impl std::fmt::Debug for CatalogSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSettings")
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .field("client_id", &mask_secret(self.client_id.as_deref()))
            .field("client_secret", &mask_secret(self.client_secret.as_deref()))
            .field("primary_market", &self.primary_market)
            .field("secondary_market", &self.secondary_market)
            .field("search_markets", &self.search_markets)
            .field("desired_count", &self.desired_count)
            .field("recommendation_limit", &self.recommendation_limit)
            .field("search_limit", &self.search_limit)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let configured_origin = file.client_origin.or_else(|| cli.client_origin.clone());
        let client_origin_configured = configured_origin.is_some();
        let client_origin =
            configured_origin.unwrap_or_else(|| DEFAULT_CLIENT_ORIGIN.to_string());

        let llm = resolve_llm(cli, file.llm.unwrap_or_default())?;
        let catalog = resolve_catalog(cli, file.catalog.unwrap_or_default())?;

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            client_origin,
            client_origin_configured,
            llm,
            catalog,
        })
    }

    /// Error message for the first missing backend credential, if any.
    pub fn missing_credentials(&self) -> Option<&'static str> {
        if !self.llm.has_credentials() {
            return Some(match self.llm.provider {
                LlmProviderKind::Gemini => "Missing GEMINI_API_KEY",
                LlmProviderKind::OpenAi => "Missing LLM api_key or api_key_command",
            });
        }
        if !self.catalog.has_credentials() {
            return Some("Missing SPOTIFY_CLIENT_ID or SPOTIFY_CLIENT_SECRET");
        }
        None
    }
}

fn resolve_llm(cli: &CliConfig, file: LlmConfig) -> Result<LlmSettings> {
    let provider = match file.provider.as_deref() {
        None => LlmProviderKind::Gemini,
        Some(s) => match LlmProviderKind::parse(s) {
            Some(p) => p,
            None => bail!("Unknown llm provider: {:?} (expected gemini or openai)", s),
        },
    };

    let (default_base_url, default_models): (&str, Vec<String>) = match provider {
        LlmProviderKind::Gemini => (
            crate::llm::GEMINI_API_BASE,
            DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        ),
        LlmProviderKind::OpenAi => (
            DEFAULT_OPENAI_BASE_URL,
            vec![DEFAULT_OPENAI_MODEL.to_string()],
        ),
    };

    let models = file.models.unwrap_or(default_models);
    if models.is_empty() {
        bail!("llm.models must list at least one model");
    }

    let temperature = file.temperature.unwrap_or(0.4);
    if !(0.0..=2.0).contains(&temperature) {
        bail!("llm.temperature must be between 0 and 2, got {}", temperature);
    }

    let max_output_tokens = file.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);
    if max_output_tokens == 0 {
        bail!("llm.max_output_tokens must be greater than 0");
    }

    // The GEMINI_API_KEY binding only makes sense for the gemini backend.
    let api_key = file.api_key.or_else(|| match provider {
        LlmProviderKind::Gemini => cli.gemini_api_key.clone(),
        LlmProviderKind::OpenAi => None,
    });

    Ok(LlmSettings {
        provider,
        base_url: file.base_url.unwrap_or_else(|| default_base_url.to_string()),
        models,
        api_key,
        api_key_command: file.api_key_command,
        temperature,
        max_output_tokens,
        timeout: Duration::from_secs(file.timeout_secs.unwrap_or(30)),
        retry_base_delay: Duration::from_millis(file.retry_base_delay_ms.unwrap_or(400)),
    })
}

fn resolve_catalog(cli: &CliConfig, file: CatalogConfig) -> Result<CatalogSettings> {
    let primary_market = file.primary_market.unwrap_or_else(|| "US".to_string());
    // An empty string in the file disables the secondary market.
    let secondary_market = match file.secondary_market {
        Some(m) if m.is_empty() => None,
        Some(m) => Some(m),
        None => Some("GB".to_string()),
    };
    let search_markets = file.search_markets.unwrap_or_else(|| {
        ["US", "GB", "CA", "AU", "DE"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    });

    let desired_count = file.desired_count.unwrap_or(10);
    if desired_count == 0 {
        bail!("catalog.desired_count must be greater than 0");
    }

    let recommendation_limit = file.recommendation_limit.unwrap_or(25);
    if !RECOMMENDATION_LIMIT_RANGE.contains(&recommendation_limit) {
        bail!(
            "catalog.recommendation_limit must be within {:?}, got {}",
            RECOMMENDATION_LIMIT_RANGE,
            recommendation_limit
        );
    }
    let search_limit = file.search_limit.unwrap_or(20);
    if !SEARCH_LIMIT_RANGE.contains(&search_limit) {
        bail!(
            "catalog.search_limit must be within {:?}, got {}",
            SEARCH_LIMIT_RANGE,
            search_limit
        );
    }

    Ok(CatalogSettings {
        token_url: file
            .token_url
            .unwrap_or_else(|| SPOTIFY_TOKEN_URL.to_string()),
        api_base: file.api_base.unwrap_or_else(|| SPOTIFY_API_BASE.to_string()),
        client_id: file.client_id.or_else(|| cli.spotify_client_id.clone()),
        client_secret: file
            .client_secret
            .or_else(|| cli.spotify_client_secret.clone()),
        primary_market,
        secondary_market,
        search_markets,
        desired_count,
        recommendation_limit,
        search_limit,
        timeout: Duration::from_secs(file.timeout_secs.unwrap_or(15)),
    })
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
