pub mod chat;
pub mod rest;
pub mod state;
pub mod sync;

pub use chat::chat_handler;
pub use rest::{health_handler, ApiDoc};
pub use sync::sync_handler;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the API routes. CORS and the Swagger UI are layered on by the binary.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sync", post(sync_handler))
        .route("/chat", post(chat_handler))
        .with_state(app_state)
}
