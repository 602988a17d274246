//! Catalog client trait and its error type.

use super::models::Track;
use super::query::{RecommendationQuery, SearchQuery};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::InvalidResponse(e.to_string())
        } else {
            CatalogError::Connection(e.to_string())
        }
    }
}

/// Service-level bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

/// Access to a music catalog with recommendation and search endpoints.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Obtain a service-level token using client credentials.
    async fn access_token(&self) -> Result<AccessToken, CatalogError>;

    /// Tracks matching seed genres and target features, in catalog order.
    async fn recommendations(
        &self,
        token: &AccessToken,
        query: &RecommendationQuery,
    ) -> Result<Vec<Track>, CatalogError>;

    /// Free-text track search, in catalog order.
    async fn search_tracks(
        &self,
        token: &AccessToken,
        query: &SearchQuery,
    ) -> Result<Vec<Track>, CatalogError>;
}
