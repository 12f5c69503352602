//! services/api/src/web/sync.rs
//!
//! HTTP wrapper around the sync engine. The handler only marshals: it reads the
//! external database URL, runs the engine on its own task and maps the outcome
//! to JSON. The run finishes even if the client goes away.

use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use reading_tracker_core::sync::{SyncAction, SyncOutcome, SyncRequest, SyncResults};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Request and Response Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SyncRequestBody {
    /// One of `test`, `export`, `import` or `both`.
    #[schema(value_type = String, example = "both")]
    pub action: SyncAction,
    pub user_id: Uuid,
}

/// Response of `POST /sync`. Copy runs fill `results`; connection tests fill
/// `connected`; failures set `success: false` and `error`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub results: Option<SyncResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResponse {
    fn from_outcome(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Completed(summary) => Self {
                success: true,
                results: Some(summary.results),
                connected: None,
                duration_ms: Some(summary.duration_ms),
                synced_at: Some(summary.synced_at),
                error: None,
            },
            SyncOutcome::ConnectionTest { connected, error } => Self {
                success: true,
                results: None,
                connected: Some(connected),
                duration_ms: None,
                synced_at: None,
                error,
            },
        }
    }
}

//=========================================================================================
// Handler
//=========================================================================================

/// Run a sync between the primary store and the external database.
#[utoipa::path(
    post,
    path = "/sync",
    request_body = SyncRequestBody,
    responses(
        (status = 200, description = "Sync finished, or connection test answered", body = SyncResponse),
        (status = 500, description = "Configuration, connection or copy failure", body = SyncResponse)
    )
)]
pub async fn sync_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<SyncRequestBody>,
) -> (StatusCode, Json<SyncResponse>) {
    let request = SyncRequest {
        action: body.action,
        user_id: body.user_id,
    };
    let external_url = (app_state.external_db_url)();

    // Detached so a client hang-up cannot cancel a copy halfway or skip closing
    // the external connection.
    let engine = app_state.sync.clone();
    let run = tokio::spawn(async move { engine.run(&request, external_url.as_deref()).await });

    match run.await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(SyncResponse::from_outcome(outcome))),
        Ok(Err(failure)) => {
            error!("Sync request failed: {}", failure);
            let response = SyncResponse {
                success: false,
                results: Some(failure.results),
                connected: None,
                duration_ms: Some(failure.duration_ms),
                synced_at: None,
                error: Some(failure.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
        }
        Err(join_error) => {
            error!("Sync task did not complete: {}", join_error);
            let response = SyncResponse {
                success: false,
                results: Some(SyncResults::default()),
                connected: None,
                duration_ms: None,
                synced_at: None,
                error: Some(format!("Sync task did not complete: {}", join_error)),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
        }
    }
}
