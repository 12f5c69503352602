//! crates/reading_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) the sync engine and the chat proxy
//! depend on. Concrete stores and API clients live in the `api` service; the
//! core only ever sees these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ChatMessage, RecordKind, SyncRow};
use crate::sync::policy::ConflictPolicy;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Quota exhausted: {0}")]
    QuotaExceeded(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

/// A relational store holding the three synced tables.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every row of `kind` owned by `user_id`.
    async fn fetch_rows(&self, kind: RecordKind, user_id: Uuid) -> PortResult<Vec<SyncRow>>;

    /// Writes one row keyed by its primary key.
    ///
    /// Returns `false` when the policy left an existing row untouched.
    async fn upsert_row(&self, row: &SyncRow, policy: ConflictPolicy) -> PortResult<bool>;
}

/// The user-supplied mirror database, opened once per sync invocation.
#[async_trait]
pub trait ExternalStore: RecordStore {
    /// Creates the mirror tables if they do not exist yet.
    async fn ensure_schema(&self) -> PortResult<()>;

    /// Round-trips a trivial statement to prove the connection is live.
    async fn ping(&self) -> PortResult<()>;

    /// Releases the connection. Further calls on this store are invalid.
    async fn close(&self);
}

#[async_trait]
pub trait ExternalStoreConnector: Send + Sync {
    /// Opens a connection to the store at `url`.
    ///
    /// A malformed URL or an unreachable host yields `PortError::Connection`.
    async fn connect(&self, url: &str) -> PortResult<Box<dyn ExternalStore>>;
}

//=========================================================================================
// Chat Port
//=========================================================================================

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Produces the assistant's next reply for the conversation.
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> PortResult<String>;
}
