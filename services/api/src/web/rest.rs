//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the health check.

use crate::web::chat::{ChatRequestBody, ChatResponse, ErrorResponse};
use crate::web::sync::{SyncRequestBody, SyncResponse};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::sync::sync_handler,
        crate::web::chat::chat_handler,
        health_handler,
    ),
    components(
        schemas(SyncRequestBody, SyncResponse, ChatRequestBody, ChatResponse, ErrorResponse)
    ),
    tags(
        (name = "Reading Tracker API", description = "External database sync and reading-companion chat.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}
