//! Mood interpretation: free-text prompt in, canonical [`MoodAttributes`] out.

mod interpreter;
mod models;
mod parse;

pub use interpreter::{MoodError, MoodInterpreter};
pub use models::{normalize_genre, MoodAttributes, TempoRange, MAX_GENRES, MAX_MOOD_TAGS};
pub use parse::extract_json_object;
