//! Catalog query parameters derived from mood attributes.

use crate::mood::{normalize_genre, MoodAttributes, MAX_GENRES};

/// Seeds used when the mood carries no genres.
pub const DEFAULT_SEED_GENRES: [&str; 5] = ["pop", "indie", "rock", "edm", "hip-hop"];

/// Search text used when the mood has neither tags nor genres.
pub const DEFAULT_SEARCH_PHRASE: &str = "top hits";

const MAX_SEARCH_QUERY_CHARS: usize = 250;

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub seed_genres: Vec<String>,
    pub target_energy: f64,
    pub target_danceability: f64,
    pub target_valence: f64,
    pub min_tempo: u32,
    pub max_tempo: u32,
    pub market: String,
    pub limit: u32,
}

impl RecommendationQuery {
    pub fn from_mood(mood: &MoodAttributes, market: &str, limit: u32) -> Self {
        let seed_genres = if mood.genres.is_empty() {
            DEFAULT_SEED_GENRES.iter().map(|g| g.to_string()).collect()
        } else {
            mood.genres.iter().take(MAX_GENRES).cloned().collect()
        };
        let (min_tempo, max_tempo) = mood.tempo_range.bpm_bounds();

        Self {
            seed_genres,
            target_energy: mood.energy,
            target_danceability: mood.danceability,
            target_valence: mood.valence,
            min_tempo,
            max_tempo,
            market: market.to_string(),
            limit,
        }
    }

    /// Query-string pairs for the recommendations endpoint.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("seed_genres", self.seed_genres.join(",")),
            ("limit", self.limit.to_string()),
            ("market", self.market.clone()),
            ("target_energy", self.target_energy.to_string()),
            ("target_danceability", self.target_danceability.to_string()),
            ("target_valence", self.target_valence.to_string()),
            ("min_tempo", self.min_tempo.to_string()),
            ("max_tempo", self.max_tempo.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub market: String,
    pub limit: u32,
}

impl SearchQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.text.clone()),
            ("type", "track".to_string()),
            ("market", self.market.clone()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Free-text search built from the mood's tag words followed by its genres.
pub fn search_text(mood: &MoodAttributes) -> String {
    let tag_words = mood
        .mood_tags
        .iter()
        .flat_map(|tag| tag.split_whitespace())
        .map(str::to_lowercase);
    let genres = mood.genres.iter().map(|g| normalize_genre(g));

    let mut words: Vec<String> = Vec::new();
    let mut len = 0;
    for word in tag_words.chain(genres) {
        if word.is_empty() || words.contains(&word) {
            continue;
        }
        if len + word.len() + 1 > MAX_SEARCH_QUERY_CHARS {
            break;
        }
        len += word.len() + 1;
        words.push(word);
    }

    if words.is_empty() {
        DEFAULT_SEARCH_PHRASE.to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mood(raw: serde_json::Value) -> MoodAttributes {
        MoodAttributes::from_raw(&raw)
    }

    #[test]
    fn recommendation_query_uses_mood_values() {
        let m = mood(json!({
            "energy": 0.2, "danceability": 0.3, "valence": 0.9,
            "tempo_range": "slow", "genres": ["ambient", "Lo Fi"]
        }));
        let q = RecommendationQuery::from_mood(&m, "US", 25);

        assert_eq!(q.seed_genres, vec!["ambient", "lo-fi"]);
        assert_eq!((q.min_tempo, q.max_tempo), (60, 90));
        assert_eq!(q.target_energy, 0.2);
        assert_eq!(q.target_danceability, 0.3);
        assert_eq!(q.target_valence, 0.9);
        assert_eq!(q.market, "US");

        let params = q.to_params();
        assert!(params.contains(&("seed_genres", "ambient,lo-fi".to_string())));
        assert!(params.contains(&("min_tempo", "60".to_string())));
        assert!(params.contains(&("limit", "25".to_string())));
    }

    #[test]
    fn empty_genres_use_default_seeds() {
        let q = RecommendationQuery::from_mood(&mood(json!({})), "GB", 10);
        assert_eq!(q.seed_genres, vec!["pop", "indie", "rock", "edm", "hip-hop"]);
        assert_eq!((q.min_tempo, q.max_tempo), (90, 130));
    }

    #[test]
    fn search_text_combines_tags_and_genres() {
        let m = mood(json!({
            "mood_tags": ["Chill", "sunny afternoon", "chill"],
            "genres": ["lo-fi", "Jazz Hop"]
        }));
        assert_eq!(search_text(&m), "chill sunny afternoon lo-fi jazz-hop");
    }

    #[test]
    fn search_text_defaults_when_empty() {
        assert_eq!(search_text(&mood(json!({}))), DEFAULT_SEARCH_PHRASE);
    }

    #[test]
    fn search_text_is_bounded() {
        let tags: Vec<String> = (0..10).map(|i| format!("{}{}", "word".repeat(10), i)).collect();
        let text = search_text(&mood(json!({ "mood_tags": tags })));
        assert!(text.len() <= MAX_SEARCH_QUERY_CHARS);
        assert!(!text.is_empty());
    }

    #[test]
    fn search_params() {
        let q = SearchQuery {
            text: "rainy jazz".to_string(),
            market: "DE".to_string(),
            limit: 20,
        };
        let params = q.to_params();
        assert!(params.contains(&("type", "track".to_string())));
        assert!(params.contains(&("q", "rainy jazz".to_string())));
    }
}
