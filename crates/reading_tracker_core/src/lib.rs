pub mod domain;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod ports;
pub mod sync;

pub use domain::{
    ChatMessage, ChatRole, Profile, ReadingSession, ReadingStatus, RecordKind, SyncRecord, SyncRow,
    UserBook,
};
pub use ports::{
    ChatCompletionService, ExternalStore, ExternalStoreConnector, PortError, PortResult,
    RecordStore,
};
pub use sync::{
    ConflictPolicy, SyncAction, SyncEngine, SyncError, SyncFailure, SyncOutcome, SyncRequest,
    SyncResults, SyncSummary, TableCounts,
};
