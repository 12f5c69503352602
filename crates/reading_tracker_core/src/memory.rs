//! crates/reading_tracker_core/src/memory.rs
//!
//! In-memory [`RecordStore`] and [`ExternalStoreConnector`] implementations for
//! tests, compiled only under `cfg(test)` or the `test-util` feature. Tables are `HashMap`s behind `std::sync::RwLock`. Both types can be
//! told to fail on purpose (a given row, a whole table read, an unreachable
//! host) and the connector tracks how many connections are still open.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Profile, ReadingSession, RecordKind, SyncRecord, SyncRow, UserBook};
use crate::ports::{ExternalStore, ExternalStoreConnector, PortError, PortResult, RecordStore};
use crate::sync::policy::ConflictPolicy;

//=========================================================================================
// InMemoryStore
//=========================================================================================

#[derive(Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<Uuid, Profile>>,
    user_books: RwLock<HashMap<Uuid, UserBook>>,
    reading_sessions: RwLock<HashMap<Uuid, ReadingSession>>,
    failing_rows: RwLock<HashSet<Uuid>>,
    failing_reads: RwLock<HashSet<RecordKind>>,
    upserts: AtomicUsize,
}

fn apply<R: SyncRecord>(
    table: &RwLock<HashMap<Uuid, R>>,
    incoming: &R,
    policy: ConflictPolicy,
) -> bool {
    let mut table = table.write().unwrap();
    match policy.apply(table.get(&incoming.id()), incoming) {
        Some(record) => {
            table.insert(record.id(), record);
            true
        }
        None => false,
    }
}

fn owned_by<R: SyncRecord>(table: &RwLock<HashMap<Uuid, R>>, user_id: Uuid) -> Vec<R> {
    let table = table.read().unwrap();
    let mut rows: Vec<R> = table
        .values()
        .filter(|r| r.user_id() == user_id)
        .cloned()
        .collect();
    rows.sort_by_key(|r| r.id());
    rows
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row directly, bypassing fault injection and counters.
    pub fn insert(&self, row: impl Into<SyncRow>) {
        match row.into() {
            SyncRow::Profile(r) => {
                self.profiles.write().unwrap().insert(r.id, r);
            }
            SyncRow::UserBook(r) => {
                self.user_books.write().unwrap().insert(r.id, r);
            }
            SyncRow::ReadingSession(r) => {
                self.reading_sessions.write().unwrap().insert(r.id, r);
            }
        }
    }

    pub fn user_book(&self, id: Uuid) -> Option<UserBook> {
        self.user_books.read().unwrap().get(&id).cloned()
    }

    /// Number of rows of `kind`, across all users.
    pub fn len(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Profiles => self.profiles.read().unwrap().len(),
            RecordKind::UserBooks => self.user_books.read().unwrap().len(),
            RecordKind::ReadingSessions => self.reading_sessions.read().unwrap().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        RecordKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    /// Makes every upsert of the row with this key fail.
    pub fn fail_upserts_of(&self, id: Uuid) {
        self.failing_rows.write().unwrap().insert(id);
    }

    /// Makes every read of this table fail.
    pub fn fail_reads_of(&self, kind: RecordKind) {
        self.failing_reads.write().unwrap().insert(kind);
    }

    /// Number of upserts attempted against this store, failed ones included.
    pub fn upsert_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch_rows(&self, kind: RecordKind, user_id: Uuid) -> PortResult<Vec<SyncRow>> {
        if self.failing_reads.read().unwrap().contains(&kind) {
            return Err(PortError::Unexpected(format!("reading {} failed", kind)));
        }
        let rows = match kind {
            RecordKind::Profiles => owned_by(&self.profiles, user_id)
                .into_iter()
                .map(SyncRow::from)
                .collect(),
            RecordKind::UserBooks => owned_by(&self.user_books, user_id)
                .into_iter()
                .map(SyncRow::from)
                .collect(),
            RecordKind::ReadingSessions => owned_by(&self.reading_sessions, user_id)
                .into_iter()
                .map(SyncRow::from)
                .collect(),
        };
        Ok(rows)
    }

    async fn upsert_row(&self, row: &SyncRow, policy: ConflictPolicy) -> PortResult<bool> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.failing_rows.read().unwrap().contains(&row.id()) {
            return Err(PortError::Unexpected(format!(
                "upsert into {} rejected row {}",
                row.kind(),
                row.id()
            )));
        }
        let written = match row {
            SyncRow::Profile(r) => apply(&self.profiles, r, policy),
            SyncRow::UserBook(r) => apply(&self.user_books, r, policy),
            SyncRow::ReadingSession(r) => apply(&self.reading_sessions, r, policy),
        };
        Ok(written)
    }
}

//=========================================================================================
// InMemoryConnector
//=========================================================================================

/// Hands out connections to one shared [`InMemoryStore`] acting as the external database.
pub struct InMemoryConnector {
    store: Arc<InMemoryStore>,
    reachable: AtomicBool,
    fail_schema: AtomicBool,
    fail_ping: AtomicBool,
    open: Arc<AtomicUsize>,
    attempts: AtomicUsize,
    provisions: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            reachable: AtomicBool::new(true),
            fail_schema: AtomicBool::new(false),
            fail_ping: AtomicBool::new(false),
            open: Arc::new(AtomicUsize::new(0)),
            attempts: AtomicUsize::new(0),
            provisions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn fail_schema(&self) {
        self.fail_schema.store(true, Ordering::SeqCst);
    }

    /// Connections still open, but the server stops answering queries.
    pub fn fail_ping(&self) {
        self.fail_ping.store(true, Ordering::SeqCst);
    }

    /// Connections handed out and not yet closed.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of `ensure_schema` calls across all connections.
    pub fn schema_provisions(&self) -> usize {
        self.provisions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalStoreConnector for InMemoryConnector {
    async fn connect(&self, url: &str) -> PortResult<Box<dyn ExternalStore>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(PortError::Connection(format!(
                "invalid external database URL '{}'",
                url
            )));
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(PortError::Connection(
                "could not reach the external database host".to_string(),
            ));
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryConnection {
            store: self.store.clone(),
            open: self.open.clone(),
            provisions: self.provisions.clone(),
            fail_schema: self.fail_schema.load(Ordering::SeqCst),
            fail_ping: self.fail_ping.load(Ordering::SeqCst),
            closed: AtomicBool::new(false),
        }))
    }
}

struct InMemoryConnection {
    store: Arc<InMemoryStore>,
    open: Arc<AtomicUsize>,
    provisions: Arc<AtomicUsize>,
    fail_schema: bool,
    fail_ping: bool,
    closed: AtomicBool,
}

impl InMemoryConnection {
    fn check_open(&self) -> PortResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PortError::Connection("connection already closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryConnection {
    async fn fetch_rows(&self, kind: RecordKind, user_id: Uuid) -> PortResult<Vec<SyncRow>> {
        self.check_open()?;
        self.store.fetch_rows(kind, user_id).await
    }

    async fn upsert_row(&self, row: &SyncRow, policy: ConflictPolicy) -> PortResult<bool> {
        self.check_open()?;
        self.store.upsert_row(row, policy).await
    }
}

#[async_trait]
impl ExternalStore for InMemoryConnection {
    async fn ensure_schema(&self) -> PortResult<()> {
        self.check_open()?;
        if self.fail_schema {
            return Err(PortError::Unexpected("permission denied for schema public".to_string()));
        }
        self.provisions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> PortResult<()> {
        self.check_open()?;
        if self.fail_ping {
            return Err(PortError::Connection("server closed the connection unexpectedly".to_string()));
        }
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
