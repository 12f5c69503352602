//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the reading-companion chat.
//! It implements the `ChatCompletionService` port from the `core` crate and is
//! a pure proxy: no conversation state is kept between calls.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reading_tracker_core::domain::{ChatMessage, ChatRole};
use reading_tracker_core::ports::{ChatCompletionService, PortError, PortResult};
use std::time::Duration;
use tracing::warn;

/// Used when the caller does not send a system prompt of its own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly reading companion. Help the user \
pick their next book, discuss what they are reading, and keep answers short and warm.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatCompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Builds the client the chat adapter should be given. Rate-limited requests
/// are not retried: a 429 reaches the caller on the first attempt.
pub fn chat_client(config: OpenAIConfig) -> Client<OpenAIConfig> {
    let no_retry = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(config).with_backoff(no_retry)
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Classifies an upstream API failure by its error code and message.
pub fn classify_api_failure(code: Option<&str>, message: &str) -> PortError {
    let lowered = message.to_lowercase();
    match code {
        Some("insufficient_quota") => PortError::QuotaExceeded(message.to_string()),
        Some("rate_limit_exceeded") => PortError::RateLimited(message.to_string()),
        _ if lowered.contains("quota") || lowered.contains("billing") => {
            PortError::QuotaExceeded(message.to_string())
        }
        _ if lowered.contains("rate limit") || lowered.contains("too many requests") => {
            PortError::RateLimited(message.to_string())
        }
        _ => PortError::Unexpected(message.to_string()),
    }
}

fn map_openai_error(e: OpenAIError) -> PortError {
    match e {
        OpenAIError::ApiError(api) => classify_api_failure(api.code.as_deref(), &api.message),
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// `ChatCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatCompletionService for OpenAiChatAdapter {
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> PortResult<String> {
        let mut request_messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(messages.len() + 1);
        request_messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for message in messages {
            let built: ChatCompletionRequestMessage = match message.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            request_messages.push(built);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            let mapped = map_openai_error(e);
            warn!("Chat completion failed: {}", mapped);
            mapped
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Chat completion returned no text content.".to_string())
            })
    }
}
