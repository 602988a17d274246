//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /api/health
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    /// GET /api/diag
    pub async fn diag(&self) -> Response {
        self.client
            .get(format!("{}/api/diag", self.base_url))
            .send()
            .await
            .expect("Diag request failed")
    }

    /// POST /api/generate with a prompt
    pub async fn generate(&self, prompt: &str) -> Response {
        self.client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .expect("Generate request failed")
    }

    /// POST /api/generate with an arbitrary raw JSON body
    pub async fn generate_raw(&self, body: &str) -> Response {
        self.client
            .post(format!("{}/api/generate", self.base_url))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Generate request failed")
    }
}
