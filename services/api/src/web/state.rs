//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::ExternalUrlSource;
use reading_tracker_core::ports::ChatCompletionService;
use reading_tracker_core::sync::SyncEngine;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sync: SyncEngine,
    /// `None` when no OpenAI key is configured; the chat route then answers 503.
    pub chat: Option<Arc<dyn ChatCompletionService>>,
    /// Read on every sync request, never cached.
    pub external_db_url: ExternalUrlSource,
}
