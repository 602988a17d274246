//! Moodtracks Server Library
//!
//! Turns a free-text mood prompt into structured mood attributes and a short
//! list of matching tracks. Exposed as a library for the binary and for tests.

pub mod config;
pub mod generator;
pub mod llm;
pub mod mood;
pub mod server;
pub mod tracks;

// Re-export commonly used types for convenience
pub use generator::{GenerateError, Playlist, PlaylistGenerator};
pub use mood::{MoodAttributes, MoodInterpreter, TempoRange};
pub use server::{run_server, RequestsLoggingLevel};
pub use tracks::{Track, TrackResolver};
