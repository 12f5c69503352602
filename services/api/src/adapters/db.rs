//! services/api/src/adapters/db.rs
//!
//! This module contains the primary database adapter, the concrete
//! implementation of the `RecordStore` port for the application's own
//! PostgreSQL database. It handles all interactions using `sqlx`.

use async_trait::async_trait;
use reading_tracker_core::domain::{RecordKind, SyncRow};
use reading_tracker_core::ports::{PortResult, RecordStore};
use reading_tracker_core::sync::ConflictPolicy;
use sqlx::PgPool;
use uuid::Uuid;

use crate::adapters::sql;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecordStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for DbAdapter {
    async fn fetch_rows(&self, kind: RecordKind, user_id: Uuid) -> PortResult<Vec<SyncRow>> {
        sql::fetch_rows(&self.pool, kind, user_id).await
    }

    async fn upsert_row(&self, row: &SyncRow, policy: ConflictPolicy) -> PortResult<bool> {
        sql::upsert_row(&self.pool, row, policy).await
    }
}
