//! crates/reading_tracker_core/src/sync/copier.rs
//!
//! One-way row copy between two stores. Tables are copied in a fixed order,
//! rows one at a time, with no transaction spanning rows or tables.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::RecordKind;
use crate::ports::RecordStore;
use crate::sync::policy::ConflictPolicy;
use crate::sync::results::{Phase, RowOutcome, SyncResults};
use crate::sync::SyncError;

/// A phase that stopped early, with the counts gathered before it stopped.
#[derive(Debug)]
pub struct PartialCopy {
    pub error: SyncError,
    pub results: SyncResults,
}

/// Copies every row owned by `user_id` from `source` into `dest`.
///
/// A row whose upsert fails is logged and counted as failed, and the copy moves
/// on; the same rule holds for both phases. Failing to read a source table ends
/// the phase.
pub async fn copy_rows<S, D>(
    source: &S,
    dest: &D,
    user_id: Uuid,
    phase: Phase,
    policy: ConflictPolicy,
    mut results: SyncResults,
) -> Result<SyncResults, PartialCopy>
where
    S: RecordStore + ?Sized,
    D: RecordStore + ?Sized,
{
    for kind in RecordKind::ALL {
        let rows = match source.fetch_rows(kind, user_id).await {
            Ok(rows) => rows,
            Err(err) => {
                return Err(PartialCopy {
                    error: SyncError::Read { kind, phase, source: err },
                    results,
                })
            }
        };
        debug!("{} {}: {} rows to copy", phase, kind, rows.len());

        for row in &rows {
            let outcome = match dest.upsert_row(row, policy).await {
                Ok(true) => RowOutcome::Written,
                Ok(false) => RowOutcome::Skipped,
                Err(e) => {
                    warn!("{} of {} row {} failed: {}", phase, kind, row.id(), e);
                    RowOutcome::Failed
                }
            };
            results = results.record(kind, phase, outcome);
        }
    }

    info!("{} phase finished for user {}", phase, user_id);
    Ok(results)
}

/// Primary store to external store.
pub async fn export_rows<P, E>(
    primary: &P,
    external: &E,
    user_id: Uuid,
    policy: ConflictPolicy,
    results: SyncResults,
) -> Result<SyncResults, PartialCopy>
where
    P: RecordStore + ?Sized,
    E: RecordStore + ?Sized,
{
    copy_rows(primary, external, user_id, Phase::Export, policy, results).await
}

/// External store to primary store.
pub async fn import_rows<P, E>(
    primary: &P,
    external: &E,
    user_id: Uuid,
    policy: ConflictPolicy,
    results: SyncResults,
) -> Result<SyncResults, PartialCopy>
where
    P: RecordStore + ?Sized,
    E: RecordStore + ?Sized,
{
    copy_rows(external, primary, user_id, Phase::Import, policy, results).await
}
