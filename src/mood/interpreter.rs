use super::models::MoodAttributes;
use super::parse::extract_json_object;
use crate::llm::{CompletionOptions, FinishReason, LlmError, LlmProvider, Message};
use crate::server::metrics;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You convert a user's natural-language mood/vibe prompt into a structured JSON with music attributes.
Return ONLY JSON with keys: mood_tags (string[]), energy (0-1), danceability (0-1), valence (0-1), tempo_range (string, one of: slow, medium, fast), genres (string[]).";

/// How much of a bad model output is kept in error messages.
const OUTPUT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum MoodError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model output is not JSON: {0}")]
    ModelOutputInvalid(String),

    #[error("Mood service unavailable after {attempts} attempt(s): {last}")]
    MoodServiceUnavailable {
        attempts: usize,
        #[source]
        last: LlmError,
    },
}

enum AttemptFailure {
    Backend(LlmError),
    Output(String),
}

/// Turns a free-text prompt into [`MoodAttributes`] using a generative backend.
pub struct MoodInterpreter {
    provider: Arc<dyn LlmProvider>,
    models: Vec<String>,
    options: CompletionOptions,
    retry_base_delay: Duration,
}

impl MoodInterpreter {
    /// # Arguments
    /// * `provider` - Generative backend.
    /// * `models` - Model names tried in order until one answers with usable JSON.
    /// * `options` - Completion options shared by every attempt.
    /// * `retry_base_delay` - Delay after the first failed attempt; grows linearly.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        models: Vec<String>,
        options: CompletionOptions,
        retry_base_delay: Duration,
    ) -> Self {
        Self {
            provider,
            models,
            options,
            retry_base_delay,
        }
    }

    pub fn build_messages(prompt: &str) -> Vec<Message> {
        vec![Message::user(format!("{}\nPrompt: {}", SYSTEM_PROMPT, prompt))]
    }

    pub async fn interpret(&self, prompt: &str) -> Result<MoodAttributes, MoodError> {
        if prompt.trim().is_empty() {
            return Err(MoodError::InvalidRequest("Prompt is required".to_string()));
        }

        let messages = Self::build_messages(prompt);
        let mut last_failure = AttemptFailure::Backend(LlmError::Connection(
            "no models configured".to_string(),
        ));

        for (attempt, model) in self.models.iter().enumerate() {
            debug!(
                provider = self.provider.name(),
                model = %model,
                attempt,
                "Interpreting mood prompt"
            );

            let failure = match self
                .provider
                .complete(model, &messages, &self.options)
                .await
            {
                Ok(response) => {
                    debug!(
                        model = %model,
                        finish_reason = ?response.finish_reason,
                        total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
                        "Mood backend answered"
                    );
                    if response.finish_reason == FinishReason::Safety {
                        warn!(model = %model, "Mood backend stopped on a safety filter");
                    }
                    match extract_json_object(&response.message.content) {
                        Some(raw) => {
                            metrics::record_llm_attempt(model, "ok");
                            let mood = MoodAttributes::from_raw(&Value::Object(raw));
                            info!(
                                model = %model,
                                tempo = ?mood.tempo_range,
                                genres = ?mood.genres,
                                "Mood interpreted"
                            );
                            return Ok(mood);
                        }
                        None => {
                            metrics::record_llm_attempt(model, "invalid_output");
                            AttemptFailure::Output(preview(&response.message.content))
                        }
                    }
                }
                Err(e) => {
                    metrics::record_llm_attempt(model, "error");
                    AttemptFailure::Backend(e)
                }
            };

            match &failure {
                AttemptFailure::Backend(e) => {
                    warn!(model = %model, error = %e, "Mood backend call failed")
                }
                AttemptFailure::Output(text) => {
                    warn!(model = %model, output = %text, "Mood backend returned no JSON")
                }
            }
            last_failure = failure;

            if attempt + 1 < self.models.len() {
                tokio::time::sleep(self.retry_base_delay * (attempt as u32 + 1)).await;
            }
        }

        Err(match last_failure {
            AttemptFailure::Output(text) => MoodError::ModelOutputInvalid(text),
            AttemptFailure::Backend(last) => MoodError::MoodServiceUnavailable {
                attempts: self.models.len(),
                last,
            },
        })
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(OUTPUT_PREVIEW_CHARS).collect();
    if text.chars().count() > OUTPUT_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
