//! Prompt-to-playlist pipeline: interpret the mood, then resolve tracks.

use crate::mood::{MoodAttributes, MoodError, MoodInterpreter};
use crate::server::metrics;
use crate::tracks::{ResolveError, Track, TrackResolver};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Mood(#[from] MoodError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl GenerateError {
    /// Stable machine-readable kind, safe to expose to clients.
    pub fn code(&self) -> &'static str {
        match self {
            GenerateError::Mood(MoodError::InvalidRequest(_)) => "InvalidRequest",
            GenerateError::Mood(MoodError::ModelOutputInvalid(_)) => "ModelOutputInvalid",
            GenerateError::Mood(MoodError::MoodServiceUnavailable { .. }) => {
                "MoodServiceUnavailable"
            }
            GenerateError::Resolve(ResolveError::CatalogAuthFailed(_)) => "CatalogAuthFailed",
            GenerateError::Resolve(ResolveError::CatalogQueryFailed { .. }) => {
                "CatalogQueryFailed"
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub mood: MoodAttributes,
    pub tracks: Vec<Track>,
    /// Fewer tracks than requested were found.
    pub degraded: bool,
}

pub struct PlaylistGenerator {
    interpreter: MoodInterpreter,
    resolver: TrackResolver,
}

impl PlaylistGenerator {
    pub fn new(interpreter: MoodInterpreter, resolver: TrackResolver) -> Self {
        Self {
            interpreter,
            resolver,
        }
    }

    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<Playlist, GenerateError> {
        let mood = self.interpreter.interpret(prompt).await?;
        info!(
            tags = ?mood.mood_tags,
            genres = ?mood.genres,
            tempo = ?mood.tempo_range,
            "Interpreted mood"
        );

        let outcome = self.resolver.resolve(&mood).await?;
        let degraded = outcome.tracks.len() < self.resolver.desired_count();
        metrics::observe_generated_tracks(outcome.tracks.len());

        Ok(Playlist {
            mood,
            tracks: outcome.tracks,
            degraded,
        })
    }
}
