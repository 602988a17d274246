//! Fake upstream services for end-to-end tests
//!
//! A single axum app stands in for both the generative backend and the music
//! catalog. Its behavior is scripted per test through [`BackendScript`], and
//! every call it receives is recorded so tests can assert on call order.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use super::constants::*;

/// What a scripted endpoint answers.
#[derive(Clone, Debug)]
pub enum Reply {
    /// 200 with the given tracks (ids), mapped into catalog track objects.
    Tracks(Vec<String>),
    /// Bare HTTP status with an error body.
    Status(u16),
}

impl Reply {
    pub fn tracks(ids: &[&str]) -> Self {
        Reply::Tracks(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// Per-test behavior of the fake backends.
#[derive(Clone, Debug)]
pub struct BackendScript {
    /// Model name -> raw text the model answers with. Unlisted models answer 503.
    pub model_replies: HashMap<String, String>,
    /// Status of the token endpoint. 200 issues a token.
    pub token_status: u16,
    /// Market -> recommendations reply. Unlisted markets answer with no tracks.
    pub recommendations: HashMap<String, Reply>,
    /// Market -> search reply. Unlisted markets answer with no tracks.
    pub search: HashMap<String, Reply>,
}

impl Default for BackendScript {
    fn default() -> Self {
        Self {
            model_replies: HashMap::from([(PRIMARY_MODEL.to_string(), CHILL_MOOD_JSON.to_string())]),
            token_status: 200,
            recommendations: HashMap::new(),
            search: HashMap::new(),
        }
    }
}

impl BackendScript {
    pub fn model_reply(mut self, model: &str, text: &str) -> Self {
        self.model_replies.insert(model.to_string(), text.to_string());
        self
    }

    pub fn without_model(mut self, model: &str) -> Self {
        self.model_replies.remove(model);
        self
    }

    pub fn token_status(mut self, status: u16) -> Self {
        self.token_status = status;
        self
    }

    pub fn recommend(mut self, market: &str, reply: Reply) -> Self {
        self.recommendations.insert(market.to_string(), reply);
        self
    }

    pub fn search(mut self, market: &str, reply: Reply) -> Self {
        self.search.insert(market.to_string(), reply);
        self
    }
}

/// A query the fake backends received, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub endpoint: String,
    /// Model for generate calls, market for catalog calls.
    pub target: Option<String>,
    pub params: HashMap<String, String>,
}

#[derive(Clone)]
struct FakeState {
    script: Arc<BackendScript>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeState {
    fn record(&self, endpoint: &str, target: Option<String>, params: HashMap<String, String>) {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            target,
            params,
        });
    }
}

/// Running fake backends.
pub struct FakeBackends {
    pub base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeBackends {
    pub async fn spawn(script: BackendScript) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            script: Arc::new(script),
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/gemini/models/{model_action}", post(generate_content))
            .route("/accounts/api/token", post(token))
            .route("/v1/recommendations", get(recommendations))
            .route("/v1/search", get(search))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backends");
        let port = listener.local_addr().expect("No local address").port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake backends failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            calls,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn gemini_base_url(&self) -> String {
        format!("{}/gemini", self.base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/accounts/api/token", self.base_url)
    }

    pub fn api_base(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Compact `endpoint[:target]` view of every recorded call.
    pub fn call_log(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| match c.target {
                Some(target) => format!("{}:{}", c.endpoint, target),
                None => c.endpoint,
            })
            .collect()
    }
}

impl Drop for FakeBackends {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Catalog track object in the shape the Web API returns.
pub fn catalog_track(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "artists": [{"name": "Fake Artist"}, {"name": "Guest"}],
        "album": {
            "name": "Fake Album",
            "images": [
                {"url": format!("https://img.test/{}/640", id)},
                {"url": format!("https://img.test/{}/300", id)}
            ]
        },
        "preview_url": null,
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)},
        "uri": format!("spotify:track:{}", id)
    })
}

fn error_status(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": {"status": status.as_u16(), "message": "scripted"}})))
        .into_response()
}

async fn generate_content(
    State(state): State<FakeState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = model_action
        .strip_suffix(":generateContent")
        .unwrap_or(&model_action)
        .to_string();
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.record(
        "generate",
        Some(model.clone()),
        HashMap::from([("prompt".to_string(), prompt)]),
    );

    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(TEST_GEMINI_KEY) {
        return error_status(403);
    }

    match state.script.model_replies.get(&model) {
        Some(text) => Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 50, "candidatesTokenCount": 40}
        }))
        .into_response(),
        None => error_status(503),
    }
}

async fn token(State(state): State<FakeState>, headers: HeaderMap, body: String) -> Response {
    state.record("token", None, HashMap::new());

    let has_basic_auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !has_basic_auth || !body.contains("grant_type=client_credentials") {
        return error_status(400);
    }

    match state.script.token_status {
        200 => Json(json!({
            "access_token": TEST_ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        status => error_status(status),
    }
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", TEST_ACCESS_TOKEN).as_str())
}

async fn recommendations(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let market = params.get("market").cloned();
    state.record("recommendations", market.clone(), params);
    if !has_bearer(&headers) {
        return error_status(401);
    }

    match market.and_then(|m| state.script.recommendations.get(&m).cloned()) {
        Some(Reply::Status(status)) => error_status(status),
        Some(Reply::Tracks(ids)) => {
            let tracks: Vec<Value> = ids.iter().map(|id| catalog_track(id)).collect();
            Json(json!({ "tracks": tracks, "seeds": [] })).into_response()
        }
        None => Json(json!({ "tracks": [], "seeds": [] })).into_response(),
    }
}

async fn search(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let market = params.get("market").cloned();
    state.record("search", market.clone(), params);
    if !has_bearer(&headers) {
        return error_status(401);
    }

    match market.and_then(|m| state.script.search.get(&m).cloned()) {
        Some(Reply::Status(status)) => error_status(status),
        Some(Reply::Tracks(ids)) => {
            let items: Vec<Value> = ids.iter().map(|id| catalog_track(id)).collect();
            let total = items.len();
            Json(json!({ "tracks": { "items": items, "total": total } })).into_response()
        }
        None => Json(json!({ "tracks": { "items": [], "total": 0 } })).into_response(),
    }
}
