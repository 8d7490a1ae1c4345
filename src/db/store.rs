//! Backend-agnostic seams for the pill catalog and the medication record table.
//!
//! The recognition pipeline and the record service only see these traits;
//! `SqliteStore` and `PostgrestStore` are the two production backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StoreError;
use crate::models::{CatalogEntry, MedicationRecord, RecordWithPill};

/// Read access to the reference pill catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Entries whose name contains `term` (case-insensitive) or whose keywords
    /// contain `term`, in the backend's natural order.
    async fn search_pills(&self, term: &str) -> Result<Vec<CatalogEntry>, StoreError>;
}

/// Append-only access to medication records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record and return the id the store acknowledged.
    async fn insert_record(&self, record: &MedicationRecord) -> Result<Uuid, StoreError>;

    /// Records with `start <= taken_at < end`, newest first.
    async fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RecordWithPill>, StoreError>;

    /// At most `limit` records, newest first.
    async fn recent_records(&self, limit: usize) -> Result<Vec<RecordWithPill>, StoreError>;
}
