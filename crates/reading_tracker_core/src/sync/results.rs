//! crates/reading_tracker_core/src/sync/results.rs
//!
//! Per-table counters for a sync run. The accumulator is a plain value that the
//! copier threads through its loops and hands back, so a run's tally is just the
//! return value of the phases that ran.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::RecordKind;

/// Which way rows flow in a copy phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Primary store to external store.
    Export,
    /// External store to primary store.
    Import,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Export => f.write_str("export"),
            Phase::Import => f.write_str("import"),
        }
    }
}

/// What happened to a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Written,
    /// The conflict policy kept the destination row.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub exported: u64,
    pub imported: u64,
    /// Rows whose upsert failed, across both phases.
    pub failed: u64,
}

/// Counters for the three synced tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResults {
    pub profiles: TableCounts,
    pub user_books: TableCounts,
    pub reading_sessions: TableCounts,
}

impl SyncResults {
    pub fn counts(&self, kind: RecordKind) -> &TableCounts {
        match kind {
            RecordKind::Profiles => &self.profiles,
            RecordKind::UserBooks => &self.user_books,
            RecordKind::ReadingSessions => &self.reading_sessions,
        }
    }

    fn counts_mut(&mut self, kind: RecordKind) -> &mut TableCounts {
        match kind {
            RecordKind::Profiles => &mut self.profiles,
            RecordKind::UserBooks => &mut self.user_books,
            RecordKind::ReadingSessions => &mut self.reading_sessions,
        }
    }

    /// Returns the tally with one more row outcome applied.
    #[must_use]
    pub fn record(mut self, kind: RecordKind, phase: Phase, outcome: RowOutcome) -> Self {
        let counts = self.counts_mut(kind);
        match (outcome, phase) {
            (RowOutcome::Written, Phase::Export) => counts.exported += 1,
            (RowOutcome::Written, Phase::Import) => counts.imported += 1,
            (RowOutcome::Failed, _) => counts.failed += 1,
            (RowOutcome::Skipped, _) => {}
        }
        self
    }

    /// Total rows written in either direction.
    pub fn total_written(&self) -> u64 {
        RecordKind::ALL
            .iter()
            .map(|kind| {
                let c = self.counts(*kind);
                c.exported + c.imported
            })
            .sum()
    }
}
