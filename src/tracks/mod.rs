//! Track resolution against a music catalog.

mod client;
mod models;
mod query;
mod resolver;
mod spotify;

pub use client::{AccessToken, CatalogClient, CatalogError};
pub use models::Track;
pub use query::{search_text, RecommendationQuery, SearchQuery, DEFAULT_SEARCH_PHRASE, DEFAULT_SEED_GENRES};
pub use resolver::{
    RecommendationOutcome, ResolveError, ResolveOutcome, ResolverSettings, TrackResolver, TrackSet,
};
pub use spotify::{SpotifyClient, SPOTIFY_API_BASE, SPOTIFY_TOKEN_URL};
