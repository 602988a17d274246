use axum::extract::FromRef;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{mask_secret, AppConfig, LlmProviderKind};
use crate::generator::PlaylistGenerator;
use crate::llm::{ApiKeySource, CompletionOptions, GeminiProvider, LlmProvider, OpenAIProvider};
use crate::mood::MoodInterpreter;
use crate::tracks::{ResolverSettings, SpotifyClient, TrackResolver};

use super::ServerConfig;

pub type GuardedGenerator = Arc<PlaylistGenerator>;

/// The generation pipeline, or the reason it could not be built.
#[derive(Clone)]
pub enum GeneratorSlot {
    Ready(GuardedGenerator),
    MissingCredentials(&'static str),
}

impl GeneratorSlot {
    /// Wire the backends described by `config` around a shared HTTP client.
    pub fn from_config(config: &AppConfig, http: reqwest::Client) -> Self {
        if let Some(message) = config.missing_credentials() {
            return GeneratorSlot::MissingCredentials(message);
        }

        let llm = &config.llm;
        let provider: Arc<dyn LlmProvider> = match llm.provider {
            LlmProviderKind::Gemini => Arc::new(GeminiProvider::new(
                http.clone(),
                &llm.base_url,
                llm.api_key.clone().unwrap_or_default(),
            )),
            LlmProviderKind::OpenAi => {
                let key_source = match (&llm.api_key_command, &llm.api_key) {
                    (Some(command), _) => ApiKeySource::Command(command.clone()),
                    (None, Some(key)) => ApiKeySource::Static(key.clone()),
                    (None, None) => ApiKeySource::None,
                };
                Arc::new(OpenAIProvider::new(http.clone(), &llm.base_url, key_source))
            }
        };
        let options = CompletionOptions {
            temperature: llm.temperature,
            max_tokens: Some(llm.max_output_tokens),
            json_output: true,
            timeout: llm.timeout,
        };
        let interpreter =
            MoodInterpreter::new(provider, llm.models.clone(), options, llm.retry_base_delay);

        let catalog = &config.catalog;
        let client = SpotifyClient::new(
            http,
            &catalog.token_url,
            &catalog.api_base,
            catalog.client_id.clone().unwrap_or_default(),
            catalog.client_secret.clone().unwrap_or_default(),
            catalog.timeout,
        );
        let resolver = TrackResolver::new(
            Arc::new(client),
            ResolverSettings {
                desired_count: catalog.desired_count,
                recommendation_limit: catalog.recommendation_limit,
                search_limit: catalog.search_limit,
                primary_market: catalog.primary_market.clone(),
                secondary_market: catalog.secondary_market.clone(),
                search_markets: catalog.search_markets.clone(),
            },
        );

        GeneratorSlot::Ready(Arc::new(PlaylistGenerator::new(interpreter, resolver)))
    }
}

/// Credential presence as exposed by the diagnostics endpoint. Holds no secrets.
///
/// The generative key is reported as `GEMINI_API_KEY` only for the gemini
/// backend, since that is the only one the env binding feeds.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CredentialsReport {
    #[serde(rename = "LLM_PROVIDER")]
    pub llm_provider: &'static str,
    #[serde(rename = "GEMINI_API_KEY", skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(rename = "LLM_API_KEY", skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
    #[serde(rename = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: String,
    #[serde(rename = "SPOTIFY_CLIENT_SECRET")]
    pub spotify_client_secret: String,
    #[serde(rename = "CLIENT_ORIGIN")]
    pub client_origin: Option<String>,
}

impl CredentialsReport {
    pub fn from_config(config: &AppConfig) -> Self {
        let llm = &config.llm;
        let (gemini_api_key, llm_api_key) = match llm.provider {
            LlmProviderKind::Gemini => (Some(mask_secret(llm.api_key.as_deref())), None),
            LlmProviderKind::OpenAi => {
                let key = match (&llm.api_key, &llm.api_key_command) {
                    (None, Some(_)) => "command".to_string(),
                    (key, _) => mask_secret(key.as_deref()),
                };
                (None, Some(key))
            }
        };

        Self {
            llm_provider: llm.provider.as_str(),
            gemini_api_key,
            llm_api_key,
            spotify_client_id: mask_secret(config.catalog.client_id.as_deref()),
            spotify_client_secret: mask_secret(config.catalog.client_secret.as_deref()),
            client_origin: config
                .client_origin_configured
                .then(|| config.client_origin.clone()),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub generator: GeneratorSlot,
    pub credentials: Arc<CredentialsReport>,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        generator: GeneratorSlot,
        credentials: CredentialsReport,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            generator,
            credentials: Arc::new(credentials),
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GeneratorSlot {
    fn from_ref(input: &ServerState) -> Self {
        input.generator.clone()
    }
}

impl FromRef<ServerState> for Arc<CredentialsReport> {
    fn from_ref(input: &ServerState) -> Self {
        input.credentials.clone()
    }
}
