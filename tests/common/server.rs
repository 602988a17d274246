//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server wired to its own fake backends.

use super::constants::*;
use super::fixtures::{BackendScript, FakeBackends, RecordedCall};
use moodtracks_server::config::{AppConfig, CatalogConfig, CliConfig, FileConfig, LlmConfig};
use moodtracks_server::server::{
    make_app, CredentialsReport, GeneratorSlot, RequestsLoggingLevel, ServerConfig,
};
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance with its own fake upstream services
///
/// When dropped, the server and its fake backends gracefully shut down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    backends: FakeBackends,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose backends answer with the default script
    pub async fn spawn() -> Self {
        Self::spawn_with(BackendScript::default()).await
    }

    /// Spawns a server whose backends follow `script`
    pub async fn spawn_with(script: BackendScript) -> Self {
        Self::spawn_inner(script, true, FileConfig::default()).await
    }

    /// Spawns a server started without any backend credentials
    pub async fn spawn_without_credentials() -> Self {
        Self::spawn_inner(BackendScript::default(), false, FileConfig::default()).await
    }

    /// Spawns a server with extra file configuration layered on top of the
    /// fake backend endpoints
    pub async fn spawn_with_config(script: BackendScript, overrides: FileConfig) -> Self {
        Self::spawn_inner(script, true, overrides).await
    }

    /// This function:
    /// 1. Starts the fake generative and catalog backends
    /// 2. Resolves an AppConfig pointing at them
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if configuration, binding or startup fails.
    async fn spawn_inner(script: BackendScript, with_credentials: bool, overrides: FileConfig) -> Self {
        let backends = FakeBackends::spawn(script).await;

        let cli = CliConfig {
            port: 0,
            metrics_port: 0,
            logging_level: RequestsLoggingLevel::None,
            client_origin: Some(TEST_CLIENT_ORIGIN.to_string()),
            gemini_api_key: with_credentials.then(|| TEST_GEMINI_KEY.to_string()),
            spotify_client_id: with_credentials.then(|| TEST_CLIENT_ID.to_string()),
            spotify_client_secret: with_credentials.then(|| TEST_CLIENT_SECRET.to_string()),
        };

        let llm = overrides.llm.unwrap_or_default();
        let catalog = overrides.catalog.unwrap_or_default();
        let file_config = FileConfig {
            llm: Some(LlmConfig {
                base_url: Some(backends.gemini_base_url()),
                retry_base_delay_ms: Some(TEST_RETRY_BASE_DELAY_MS),
                timeout_secs: Some(5),
                ..llm
            }),
            catalog: Some(CatalogConfig {
                token_url: Some(backends.token_url()),
                api_base: Some(backends.api_base()),
                timeout_secs: Some(5),
                ..catalog
            }),
            ..FileConfig::default()
        };

        let app_config =
            AppConfig::resolve(&cli, Some(file_config)).expect("Failed to resolve test config");

        let http = reqwest::Client::new();
        let generator = GeneratorSlot::from_config(&app_config, http);
        let credentials = CredentialsReport::from_config(&app_config);

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: app_config.logging_level.clone(),
            port,
            metrics_port: 0,
            client_origin: app_config.client_origin.clone(),
        };
        let app = make_app(config, generator, credentials).expect("Failed to build app");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            backends,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Every call the fake backends received, in order
    #[allow(dead_code)]
    pub fn backend_calls(&self) -> Vec<RecordedCall> {
        self.backends.calls()
    }

    /// Compact `endpoint[:target]` view of the backend calls
    #[allow(dead_code)]
    pub fn backend_log(&self) -> Vec<String> {
        self.backends.call_log()
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
