//! Provider for any backend speaking the OpenAI chat completions API
//! (OpenAI itself, OpenRouter, vLLM, Ollama's `/v1` endpoint).

use super::provider::{ensure_success, CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const API_KEY_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the bearer token for each request comes from.
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    None,
    Static(String),
    /// Shell command printing the key on stdout, run before every request so
    /// rotated keys are picked up.
    Command(String),
}

impl ApiKeySource {
    async fn resolve(&self) -> Result<Option<String>, LlmError> {
        let command = match self {
            ApiKeySource::None => return Ok(None),
            ApiKeySource::Static(key) => return Ok(Some(key.clone())),
            ApiKeySource::Command(command) => command,
        };

        let run = Command::new("sh").arg("-c").arg(command).output();
        let output = tokio::time::timeout(API_KEY_COMMAND_TIMEOUT, run)
            .await
            .map_err(|_| LlmError::Timeout)?
            .map_err(|e| LlmError::Connection(format!("api_key_command did not run: {}", e)))?;

        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "api_key_command failed"
            );
            return Err(LlmError::Connection(format!(
                "api_key_command exited with {}",
                output.status
            )));
        }

        match String::from_utf8_lossy(&output.stdout).trim() {
            "" => Err(LlmError::Connection(
                "api_key_command printed an empty key".to_string(),
            )),
            key => Ok(Some(key.to_string())),
        }
    }
}

pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: ApiKeySource,
}

impl OpenAIProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKeySource) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let body = ChatRequest::new(model, messages, options);
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(options.timeout)
            .json(&body);
        if let Some(key) = self.api_key.resolve().await? {
            request = request.bearer_auth(key);
        }

        debug!(model = %model, json_output = options.json_output, "Requesting chat completion");
        let response = ensure_success(request.send().await?).await?;

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("chat completion body: {}", e)))?;
        chat.into_completion()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [Message], options: &CompletionOptions) -> Self {
        Self {
            model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for ChatMessage<'a> {
    fn from(msg: &'a Message) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        ChatMessage {
            role,
            content: &msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices returned".to_string()))?;

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            finish_reason: match choice.finish_reason.as_deref() {
                Some("stop") | None => FinishReason::Stop,
                Some("length") => FinishReason::MaxTokens,
                Some("content_filter") => FinishReason::Safety,
                Some(_) => FinishReason::Other,
            },
            usage: self.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
