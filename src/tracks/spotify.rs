//! Spotify Web API client.
//!
//! Uses the client-credentials flow; tokens are fetched per request and never cached.

use super::client::{AccessToken, CatalogClient, CatalogError};
use super::models::{RecommendationsResponse, SearchResponse, SpotifyTrack, TokenResponse, Track};
use super::query::{RecommendationQuery, SearchQuery};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

pub struct SpotifyClient {
    client: Client,
    token_url: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl SpotifyClient {
    /// # Arguments
    /// * `client` - Shared HTTP client.
    /// * `token_url` - OAuth2 token endpoint.
    /// * `api_base` - Web API base URL, without trailing slash.
    /// * `client_id`, `client_secret` - Application credentials.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout,
        }
    }

    async fn check_status(response: Response) -> Result<Response, CatalogError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(CatalogError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Auth(
                response.text().await.unwrap_or_default(),
            )),
            _ => Err(CatalogError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn access_token(&self) -> Result<AccessToken, CatalogError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .timeout(self.timeout)
            .send()
            .await?;

        // The token endpoint answers 400 for bad client credentials.
        let response = match response.status() {
            StatusCode::BAD_REQUEST => {
                return Err(CatalogError::Auth(
                    response.text().await.unwrap_or_default(),
                ))
            }
            _ => Self::check_status(response).await?,
        };

        let body: TokenResponse = response.json().await?;
        if body.access_token.is_empty() {
            return Err(CatalogError::InvalidResponse(
                "Token endpoint returned an empty access_token".to_string(),
            ));
        }
        debug!(expires_in = ?body.expires_in, "Obtained catalog access token");
        Ok(AccessToken::new(body.access_token))
    }

    async fn recommendations(
        &self,
        token: &AccessToken,
        query: &RecommendationQuery,
    ) -> Result<Vec<Track>, CatalogError> {
        let url = format!("{}/recommendations", self.api_base);
        debug!(market = %query.market, seeds = ?query.seed_genres, "Requesting recommendations");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .query(&query.to_params())
            .timeout(self.timeout)
            .send()
            .await?;
        let body: RecommendationsResponse = Self::check_status(response).await?.json().await?;

        Ok(body
            .tracks
            .into_iter()
            .filter_map(SpotifyTrack::into_track)
            .collect())
    }

    async fn search_tracks(
        &self,
        token: &AccessToken,
        query: &SearchQuery,
    ) -> Result<Vec<Track>, CatalogError> {
        let url = format!("{}/search", self.api_base);
        debug!(market = %query.market, q = %query.text, "Searching tracks");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .query(&query.to_params())
            .timeout(self.timeout)
            .send()
            .await?;
        let body: SearchResponse = Self::check_status(response).await?.json().await?;

        Ok(body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(SpotifyTrack::into_track)
            .collect())
    }
}
