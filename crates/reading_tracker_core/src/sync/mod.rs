//! crates/reading_tracker_core/src/sync/mod.rs
//!
//! Copies a user's rows between the primary store and a user-supplied external
//! Postgres database.
//!
//! A "two-way" sync is two one-way copies run back to back: export first, then
//! import. Whatever the external store holds when the import phase runs is what
//! the primary store ends up with, for every row present on both sides.

pub mod copier;
pub mod engine;
pub mod policy;
pub mod results;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::RecordKind;
use crate::ports::PortError;

pub use engine::SyncEngine;
pub use policy::ConflictPolicy;
pub use results::{Phase, RowOutcome, SyncResults, TableCounts};

/// What a sync invocation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// Check that the external store is reachable; copies nothing.
    Test,
    Export,
    Import,
    /// Export, then import.
    Both,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncAction::Test => "test",
            SyncAction::Export => "export",
            SyncAction::Import => "import",
            SyncAction::Both => "both",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub action: SyncAction,
    pub user_id: Uuid,
}

/// The result of a copy run that reached the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub action: SyncAction,
    pub results: SyncResults,
    pub duration_ms: u64,
    /// When the run finished. Clients keep this as their "last synced" marker.
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Completed(SyncSummary),
    /// Answer to [`SyncAction::Test`]. An unreachable store is reported here,
    /// not as an error.
    ConnectionTest {
        connected: bool,
        error: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("EXTERNAL_DB_URL is not configured")]
    MissingExternalUrl,

    #[error("{0}")]
    Connection(PortError),

    #[error("Failed to prepare external tables: {0}")]
    Schema(PortError),

    #[error("Failed to read {kind} during {phase}: {source}")]
    Read {
        kind: RecordKind,
        phase: Phase,
        #[source]
        source: PortError,
    },
}

/// A run that stopped early. `results` holds whatever was counted before the stop.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SyncFailure {
    pub error: SyncError,
    pub results: SyncResults,
    pub duration_ms: u64,
}
