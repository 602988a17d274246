//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{BackendScript, Reply, TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_generate() {
//!     let script = BackendScript::default().recommend("US", Reply::tracks(&["a", "b"]));
//!     let server = TestServer::spawn_with(script).await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.generate("chill sunny afternoon").await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{catalog_track, BackendScript, RecordedCall, Reply};
pub use server::TestServer;
