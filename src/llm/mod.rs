//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for generative-language
//! backends, allowing the mood interpreter to work with Gemini or any
//! OpenAI-compatible service.

mod gemini;
mod openai;
mod provider;
mod types;

pub use gemini::{GeminiProvider, GEMINI_API_BASE};
pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
