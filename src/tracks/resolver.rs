use super::client::{AccessToken, CatalogClient, CatalogError};
use super::models::Track;
use super::query::{search_text, RecommendationQuery, SearchQuery};
use crate::mood::MoodAttributes;
use crate::server::metrics;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Catalog authentication failed: {0}")]
    CatalogAuthFailed(#[source] CatalogError),

    #[error("Every catalog query failed after {attempts} attempt(s): {last}")]
    CatalogQueryFailed {
        attempts: usize,
        #[source]
        last: CatalogError,
    },
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub desired_count: usize,
    pub recommendation_limit: u32,
    pub search_limit: u32,
    pub primary_market: String,
    pub secondary_market: Option<String>,
    pub search_markets: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            desired_count: 10,
            recommendation_limit: 25,
            search_limit: 20,
            primary_market: "US".to_string(),
            secondary_market: Some("GB".to_string()),
            search_markets: ["US", "GB", "CA", "AU", "DE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// How the recommendation step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationOutcome {
    /// A market answered; `added` tracks survived dedup and truncation.
    Matched { market: String, added: usize },
    /// The catalog reported no matching resource.
    NotFound,
    /// Every recommendation market failed.
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub tracks: Vec<Track>,
    pub recommendations: RecommendationOutcome,
    /// Markets whose search results contributed at least one track, in order.
    pub topped_up_from: Vec<String>,
}

/// Ordered, id-unique, bounded collection of tracks for one request.
#[derive(Debug)]
pub struct TrackSet {
    tracks: Vec<Track>,
    seen: HashSet<String>,
    capacity: usize,
}

impl TrackSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            tracks: Vec::with_capacity(capacity),
            seen: HashSet::new(),
            capacity,
        }
    }

    /// Append unseen tracks in order until full. Returns how many were added.
    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) -> usize {
        let before = self.tracks.len();
        for track in tracks {
            if self.is_full() {
                break;
            }
            if self.seen.insert(track.id.clone()) {
                self.tracks.push(track);
            }
        }
        self.tracks.len() - before
    }

    pub fn is_full(&self) -> bool {
        self.tracks.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn into_vec(self) -> Vec<Track> {
        self.tracks
    }
}

/// Turns mood attributes into a bounded, deduplicated track list.
pub struct TrackResolver {
    client: Arc<dyn CatalogClient>,
    settings: ResolverSettings,
}

impl TrackResolver {
    pub fn new(client: Arc<dyn CatalogClient>, settings: ResolverSettings) -> Self {
        Self { client, settings }
    }

    pub fn desired_count(&self) -> usize {
        self.settings.desired_count
    }

    pub async fn resolve(&self, mood: &MoodAttributes) -> Result<ResolveOutcome, ResolveError> {
        let token = self.client.access_token().await.map_err(|e| {
            metrics::record_catalog_call("token", "-", "error");
            error!(error = %e, "Catalog token request failed");
            ResolveError::CatalogAuthFailed(e)
        })?;
        metrics::record_catalog_call("token", "-", "ok");

        let mut collected = TrackSet::new(self.settings.desired_count);
        let mut failures: Vec<CatalogError> = Vec::new();

        let recommendations = self
            .recommend(&token, mood, &mut collected, &mut failures)
            .await;

        let mut topped_up_from = Vec::new();
        let mut search_answered = false;
        if !collected.is_full() {
            search_answered = self
                .top_up(&token, mood, &mut collected, &mut failures, &mut topped_up_from)
                .await;
        }

        if recommendations == RecommendationOutcome::Failed && !search_answered {
            let attempts = failures.len();
            let last = failures.pop().unwrap_or_else(|| {
                CatalogError::Connection("no catalog markets configured".to_string())
            });
            error!(attempts, error = %last, "All catalog query paths failed");
            return Err(ResolveError::CatalogQueryFailed { attempts, last });
        }

        info!(
            tracks = collected.len(),
            desired = self.settings.desired_count,
            recommendations = ?recommendations,
            topped_up_from = ?topped_up_from,
            "Resolved tracks"
        );

        Ok(ResolveOutcome {
            tracks: collected.into_vec(),
            recommendations,
            topped_up_from,
        })
    }

    fn recommendation_markets(&self) -> Vec<&str> {
        let mut markets = vec![self.settings.primary_market.as_str()];
        if let Some(secondary) = self.settings.secondary_market.as_deref() {
            if secondary != self.settings.primary_market {
                markets.push(secondary);
            }
        }
        markets
    }

    async fn recommend(
        &self,
        token: &AccessToken,
        mood: &MoodAttributes,
        collected: &mut TrackSet,
        failures: &mut Vec<CatalogError>,
    ) -> RecommendationOutcome {
        for market in self.recommendation_markets() {
            let query =
                RecommendationQuery::from_mood(mood, market, self.settings.recommendation_limit);
            match self.client.recommendations(token, &query).await {
                Ok(tracks) => {
                    metrics::record_catalog_call("recommendations", market, "ok");
                    let added = collected.extend(tracks);
                    return RecommendationOutcome::Matched {
                        market: market.to_string(),
                        added,
                    };
                }
                Err(CatalogError::NotFound) => {
                    metrics::record_catalog_call("recommendations", market, "not_found");
                    info!(market, "No recommendations found, treating as empty");
                    return RecommendationOutcome::NotFound;
                }
                Err(e) => {
                    metrics::record_catalog_call("recommendations", market, "error");
                    warn!(market, error = %e, "Recommendation query failed");
                    failures.push(e);
                }
            }
        }
        RecommendationOutcome::Failed
    }

    /// Search each market in order until the set is full.
    /// Returns whether any market answered successfully.
    async fn top_up(
        &self,
        token: &AccessToken,
        mood: &MoodAttributes,
        collected: &mut TrackSet,
        failures: &mut Vec<CatalogError>,
        topped_up_from: &mut Vec<String>,
    ) -> bool {
        let text = search_text(mood);
        let mut answered = false;

        for market in &self.settings.search_markets {
            if collected.is_full() {
                break;
            }
            let query = SearchQuery {
                text: text.clone(),
                market: market.clone(),
                limit: self.settings.search_limit,
            };
            match self.client.search_tracks(token, &query).await {
                Ok(tracks) => {
                    metrics::record_catalog_call("search", market, "ok");
                    answered = true;
                    if collected.extend(tracks) > 0 {
                        topped_up_from.push(market.clone());
                    }
                }
                Err(e) => {
                    metrics::record_catalog_call("search", market, "error");
                    warn!(market = %market, error = %e, "Search top-up failed");
                    failures.push(e);
                }
            }
        }
        answered
    }
}
