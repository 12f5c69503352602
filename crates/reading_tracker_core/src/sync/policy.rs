//! crates/reading_tracker_core/src/sync/policy.rs
//!
//! The rule applied when a copied row meets an existing row with the same key.

use serde::{Deserialize, Serialize};

use crate::domain::SyncRecord;

/// How an upsert resolves a primary-key conflict in the destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Last writer wins: every mutable field is replaced by the incoming row,
    /// the destination keeps its key and creation timestamp.
    #[default]
    OverwriteMutable,
    /// The destination row is left untouched; only missing rows are inserted.
    KeepExisting,
}

impl ConflictPolicy {
    /// Resolves `incoming` against the row currently stored under the same key.
    ///
    /// Returns the row to store, or `None` when the destination must not change.
    pub fn apply<R: SyncRecord>(self, existing: Option<&R>, incoming: &R) -> Option<R> {
        match (existing, self) {
            (None, _) => Some(incoming.clone()),
            (Some(current), ConflictPolicy::OverwriteMutable) => Some(current.merge_from(incoming)),
            (Some(_), ConflictPolicy::KeepExisting) => None,
        }
    }

    /// Renders the policy as a Postgres `ON CONFLICT` clause on the `id` column.
    pub fn conflict_clause(self, mutable_columns: &[&str]) -> String {
        match self {
            ConflictPolicy::OverwriteMutable => {
                let assignments = mutable_columns
                    .iter()
                    .map(|col| format!("{col} = EXCLUDED.{col}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("ON CONFLICT (id) DO UPDATE SET {assignments}")
            }
            ConflictPolicy::KeepExisting => "ON CONFLICT (id) DO NOTHING".to_string(),
        }
    }
}
