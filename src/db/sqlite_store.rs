use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::store::{CatalogStore, RecordStore};
use super::{sqlite, DatabaseError, StoreError};
use crate::models::{CatalogEntry, MedicationRecord, RecordWithPill};

/// Local SQLite backend for both the catalog and the record table.
///
/// rusqlite is synchronous: every call runs on the blocking pool with the
/// connection mutex held only for the duration of the statement.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open (and migrate) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(sqlite::open_database(path)?))
    }

    /// Fresh in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(sqlite::open_memory_database()?))
    }

    /// Add a catalog entry. The catalog is read-only to the pipeline; this is
    /// for seeding a local catalog.
    pub async fn add_pill(&self, pill: CatalogEntry) -> Result<(), StoreError> {
        self.run(move |conn| repository::insert_pill(conn, &pill)).await
    }

    async fn run<F, T>(&self, task: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Query("database connection lock poisoned".into()))?;
            task(&guard).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Query(format!("database task failed: {e}")))?
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn search_pills(&self, term: &str) -> Result<Vec<CatalogEntry>, StoreError> {
        let term = term.to_string();
        self.run(move |conn| repository::search_pills(conn, &term)).await
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_record(&self, record: &MedicationRecord) -> Result<Uuid, StoreError> {
        let record = record.clone();
        let id = record.id;
        self.run(move |conn| repository::insert_medication_record(conn, &record))
            .await
            .map_err(|e| match e {
                StoreError::Database(db) => StoreError::Write(db.to_string()),
                other => other,
            })?;
        Ok(id)
    }

    async fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RecordWithPill>, StoreError> {
        self.run(move |conn| repository::get_records_between(conn, &start, &end))
            .await
    }

    async fn recent_records(&self, limit: usize) -> Result<Vec<RecordWithPill>, StoreError> {
        self.run(move |conn| repository::get_recent_records(conn, limit))
            .await
    }
}
