//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When fake backend data changes (models, credentials, canned replies),
//! update only this file.

// ============================================================================
// Credentials handed to the server under test
// ============================================================================

/// Gemini API key the fake backend accepts
pub const TEST_GEMINI_KEY: &str = "test-gemini-key";

/// Catalog client id
pub const TEST_CLIENT_ID: &str = "test-client-id";

/// Catalog client secret
pub const TEST_CLIENT_SECRET: &str = "test-client-secret";

/// Bearer token issued by the fake token endpoint
pub const TEST_ACCESS_TOKEN: &str = "fake-access-token";

/// Origin allowed by CORS
pub const TEST_CLIENT_ORIGIN: &str = "http://localhost:5173";

// ============================================================================
// Generative backend
// ============================================================================

/// First model tried
pub const PRIMARY_MODEL: &str = "gemini-1.5-flash";

/// Fallback model
pub const FALLBACK_MODEL: &str = "gemini-1.5-flash-8b";

/// Well-formed answer for a "chill sunny afternoon" prompt
pub const CHILL_MOOD_JSON: &str = r#"{"mood_tags":["chill","sunny"],"energy":0.3,"danceability":0.5,"valence":0.8,"tempo_range":"medium","genres":["lo-fi","chillhop"]}"#;

/// Prose-wrapped answer with out-of-range values
pub const PROSE_MOOD_REPLY: &str = r#"Sure! Here you go: {"mood_tags":["dark"],"energy":1.7,"danceability":"0.2","valence":-3,"tempo_range":"FAST","genres":["Dark Techno","industrial","ebm","synthwave","darkwave","minimal"]} Enjoy."#;

/// Answer with no recoverable JSON object
pub const UNPARSEABLE_REPLY: &str = "I'm sorry, I can only talk about the weather.";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Retry base delay configured on the server under test (milliseconds)
pub const TEST_RETRY_BASE_DELAY_MS: u64 = 5;
