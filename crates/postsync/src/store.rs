//! Record store seen by the reconciliation loop.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::{post_repo, Database, DatabaseError};

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or queried. Fatal to a pass.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// Persisting the outcome for one record failed.
    #[error("Failed to write record {id}: {message}")]
    Write { id: i64, message: String },
}

/// The four store operations a reconciliation pass relies on.
pub trait RecordStore: Send + Sync {
    /// Ids with `processed = false` and no error.
    fn list_eligible_ids(&self) -> Result<Vec<i64>, StoreError>;

    fn apply_enrichment(
        &self,
        id: i64,
        title: &str,
        description: &str,
        owner_id: i64,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn mark_failed(
        &self,
        id: i64,
        error_message: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Appends a quarantine entry with `reprocessed = false`.
    fn append_reprocessing(
        &self,
        record_id: i64,
        attempted_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// `RecordStore` backed by the SQLite `Database`.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn write_error(id: i64) -> impl FnOnce(DatabaseError) -> StoreError {
    move |e| StoreError::Write {
        id,
        message: e.to_string(),
    }
}

impl RecordStore for SqliteStore {
    fn list_eligible_ids(&self) -> Result<Vec<i64>, StoreError> {
        post_repo::find_eligible_ids(&self.db).map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn apply_enrichment(
        &self,
        id: i64,
        title: &str,
        description: &str,
        owner_id: i64,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let changed = post_repo::update_enrichment(
            &self.db,
            id,
            title,
            description,
            owner_id,
            &processed_at.to_rfc3339(),
        )
        .map_err(write_error(id))?;

        if changed == 0 {
            log::warn!("Enrichment for post {} matched no row", id);
        }
        Ok(())
    }

    fn mark_failed(
        &self,
        id: i64,
        error_message: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let changed =
            post_repo::update_failed(&self.db, id, error_message, &processed_at.to_rfc3339())
                .map_err(write_error(id))?;

        if changed == 0 {
            log::warn!("Failure marker for post {} matched no row", id);
        }
        Ok(())
    }

    fn append_reprocessing(
        &self,
        record_id: i64,
        attempted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        post_repo::insert_reprocessing(&self.db, record_id, &attempted_at.to_rfc3339())
            .map_err(write_error(record_id))?;
        Ok(())
    }
}
