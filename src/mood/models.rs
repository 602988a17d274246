//! Canonical mood attributes and their normalization rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_MOOD_TAGS: usize = 10;
pub const MAX_GENRES: usize = 5;
pub const DEFAULT_UNIT_VALUE: f64 = 0.6;

/// Coarse tempo bucket requested by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoRange {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl TempoRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Some(Self::Slow),
            "medium" => Some(Self::Medium),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }

    /// Inclusive BPM bounds used as `min_tempo`/`max_tempo` on catalog queries.
    pub fn bpm_bounds(&self) -> (u32, u32) {
        match self {
            Self::Slow => (60, 90),
            Self::Medium => (90, 130),
            Self::Fast => (130, 180),
        }
    }
}

/// Structured representation of a free-text vibe description.
///
/// Values of this type only come out of [`MoodAttributes::from_raw`], so every
/// field is always within its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAttributes {
    pub mood_tags: Vec<String>,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub tempo_range: TempoRange,
    pub genres: Vec<String>,
}

impl Default for MoodAttributes {
    fn default() -> Self {
        Self::from_raw(&Value::Null)
    }
}

impl MoodAttributes {
    /// Normalize whatever the model produced into canonical attributes.
    ///
    /// Never fails: missing or malformed fields fall back to their defaults.
    pub fn from_raw(raw: &Value) -> Self {
        let field = |key: &str| raw.as_object().and_then(|o| o.get(key));

        Self {
            mood_tags: string_list(field("mood_tags"), MAX_MOOD_TAGS, |s| s.to_string()),
            energy: unit_value(field("energy")),
            danceability: unit_value(field("danceability")),
            valence: unit_value(field("valence")),
            tempo_range: field("tempo_range")
                .and_then(Value::as_str)
                .and_then(TempoRange::parse)
                .unwrap_or_default(),
            genres: string_list(field("genres"), MAX_GENRES, normalize_genre),
        }
    }
}

/// Lowercase a genre name and collapse inner whitespace into hyphens.
pub fn normalize_genre(genre: &str) -> String {
    genre
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

fn unit_value(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if !n.is_nan() => n.clamp(0.0, 1.0),
        _ => DEFAULT_UNIT_VALUE,
    }
}

fn string_list(value: Option<&Value>, max: usize, map: impl Fn(&str) -> String) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(map)
        .take(max)
        .collect()
}
