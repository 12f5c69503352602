//! services/api/src/web/chat.rs
//!
//! The chat proxy endpoint. Forwards a conversation to the completion service
//! and maps upstream failures to status codes the client can act on.

use crate::adapters::chat_llm::DEFAULT_SYSTEM_PROMPT;
use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use reading_tracker_core::domain::ChatMessage;
use reading_tracker_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ChatRequestBody {
    /// Conversation so far, oldest first. Roles are `user` or `assistant`.
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

type ChatError = (StatusCode, Json<ErrorResponse>);

fn chat_error(status: StatusCode, message: &str) -> ChatError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn map_port_error(e: &PortError) -> ChatError {
    match e {
        PortError::RateLimited(_) => chat_error(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please wait a moment and try again.",
        ),
        PortError::QuotaExceeded(_) => chat_error(
            StatusCode::PAYMENT_REQUIRED,
            "AI usage quota exhausted. Please try again later.",
        ),
        _ => chat_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate a reply.",
        ),
    }
}

/// Ask the reading companion for its next reply.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Reply generated", body = ChatResponse),
        (status = 400, description = "No messages were sent", body = ErrorResponse),
        (status = 402, description = "Upstream quota exhausted", body = ErrorResponse),
        (status = 429, description = "Upstream rate limit hit", body = ErrorResponse),
        (status = 503, description = "Chat is not configured", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<ChatRequestBody>,
) -> Result<Json<ChatResponse>, ChatError> {
    let chat = app_state.chat.as_ref().ok_or_else(|| {
        chat_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Chat is not configured on this server.",
        )
    })?;

    if body.messages.is_empty() {
        return Err(chat_error(
            StatusCode::BAD_REQUEST,
            "At least one message is required.",
        ));
    }

    let system_prompt = body
        .system_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    match chat.complete(system_prompt, &body.messages).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(e) => {
            error!("Chat request failed: {:?}", e);
            Err(map_port_error(&e))
        }
    }
}
