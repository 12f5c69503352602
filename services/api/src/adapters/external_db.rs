//! services/api/src/adapters/external_db.rs
//!
//! Adapter for the user-supplied external Postgres database. A connection is
//! opened per sync invocation, the mirror tables are provisioned on demand, and
//! the pool is closed when the invocation ends.

use async_trait::async_trait;
use reading_tracker_core::domain::{RecordKind, SyncRow};
use reading_tracker_core::ports::{
    ExternalStore, ExternalStoreConnector, PortError, PortResult, RecordStore,
};
use reading_tracker_core::sync::ConflictPolicy;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::adapters::sql;

//=========================================================================================
// Connector
//=========================================================================================

/// Opens single-connection pools to external databases.
#[derive(Clone, Debug)]
pub struct PgExternalConnector {
    connect_timeout: Duration,
}

impl PgExternalConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for PgExternalConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Turns a connect failure into a message the client can show as-is.
fn describe_connect_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Configuration(inner) => {
            PortError::Connection(format!("Invalid external database URL: {}", inner))
        }
        other => PortError::Connection(format!("Could not connect to external database: {}", other)),
    }
}

#[async_trait]
impl ExternalStoreConnector for PgExternalConnector {
    async fn connect(&self, url: &str) -> PortResult<Box<dyn ExternalStore>> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.connect_timeout)
            .connect(url)
            .await
            .map_err(describe_connect_error)?;
        info!("Connected to external database.");
        Ok(Box::new(PgExternalStore { pool }))
    }
}

//=========================================================================================
// Store
//=========================================================================================

pub struct PgExternalStore {
    pool: PgPool,
}

#[async_trait]
impl RecordStore for PgExternalStore {
    async fn fetch_rows(&self, kind: RecordKind, user_id: Uuid) -> PortResult<Vec<SyncRow>> {
        sql::fetch_rows(&self.pool, kind, user_id).await
    }

    async fn upsert_row(&self, row: &SyncRow, policy: ConflictPolicy) -> PortResult<bool> {
        sql::upsert_row(&self.pool, row, policy).await
    }
}

#[async_trait]
impl ExternalStore for PgExternalStore {
    async fn ensure_schema(&self) -> PortResult<()> {
        for ddl in sql::MIRROR_SCHEMA {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        Ok(())
    }

    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("External database connection closed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_a_connection_error() {
        let connector = PgExternalConnector::new(Duration::from_millis(200));
        let err = connector.connect("not a url").await.err().unwrap();
        match err {
            PortError::Connection(msg) => assert!(msg.contains("external database")),
            other => panic!("expected a connection error, got {:?}", other),
        }
    }
}
