use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::metrics::{init_metrics, metrics_handler, record_error};
use super::{log_requests, state::*, ServerConfig};
use crate::generator::GenerateError;
use crate::mood::MoodError;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct GenerateBody {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// One validation problem, addressed by the path of the offending field.
#[derive(Serialize, Debug)]
struct ValidationIssue {
    path: Vec<String>,
    message: String,
}

impl ValidationIssue {
    fn new(path: &[&str], message: impl Into<String>) -> Self {
        Self {
            path: path.iter().map(|p| p.to_string()).collect(),
            message: message.into(),
        }
    }
}

fn invalid_request(details: Vec<ValidationIssue>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request", "details": details })),
    )
        .into_response()
}

fn validate_generate_body(body: GenerateBody) -> Result<String, Vec<ValidationIssue>> {
    match body.prompt {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
        _ => Err(vec![ValidationIssue::new(&["prompt"], "Prompt is required")]),
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        if let GenerateError::Mood(MoodError::InvalidRequest(message)) = &self {
            return invalid_request(vec![ValidationIssue::new(&["prompt"], message.clone())]);
        }

        let code = self.code();
        error!(code, error = %self, source = ?std::error::Error::source(&self), "Generation failed");
        record_error(code, "/api/generate");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error", "code": code })),
        )
            .into_response()
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn diag(State(credentials): State<Arc<CredentialsReport>>) -> impl IntoResponse {
    Json(json!({ "env": &*credentials }))
}

async fn generate(
    State(slot): State<GeneratorSlot>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Response {
    let generator = match slot {
        GeneratorSlot::Ready(generator) => generator,
        GeneratorSlot::MissingCredentials(message) => {
            warn!("Rejecting generate request: {}", message);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return invalid_request(vec![ValidationIssue::new(&[], rejection.body_text())]);
        }
    };

    let prompt = match validate_generate_body(body) {
        Ok(prompt) => prompt,
        Err(details) => return invalid_request(details),
    };

    match generator.generate(&prompt).await {
        Ok(playlist) => Json(playlist).into_response(),
        Err(err) => err.into_response(),
    }
}

fn make_cors_layer(client_origin: &str) -> Result<CorsLayer> {
    // Credentialed CORS cannot be combined with a wildcard origin.
    if client_origin.trim() == "*" {
        bail!("client_origin must be an explicit origin, not '*'");
    }
    let origin: HeaderValue = client_origin
        .parse()
        .with_context(|| format!("Invalid client origin: {:?}", client_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn make_app(
    config: ServerConfig,
    generator: GeneratorSlot,
    credentials: CredentialsReport,
) -> Result<Router> {
    let cors = make_cors_layer(&config.client_origin)?;
    let state = ServerState::new(config, generator, credentials);

    let api_routes: Router = Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health))
        .route("/diag", get(diag))
        .with_state(state.clone());

    let app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/api", api_routes)
        .layer(cors)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(
    config: ServerConfig,
    generator: GeneratorSlot,
    credentials: CredentialsReport,
) -> Result<()> {
    init_metrics();

    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, generator, credentials)?;

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server error: {}", e);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
