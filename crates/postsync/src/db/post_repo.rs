//! Post repository: operations on the `posts` and `post_reprocessing` tables.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw post row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub processed: bool,
    pub processed_at: Option<String>,
    pub error: Option<String>,
    pub owner_id: Option<i64>,
}

impl PostRow {
    /// A fresh pending post with empty content.
    pub fn pending(id: i64) -> Self {
        Self {
            id,
            title: String::new(),
            description: String::new(),
            processed: false,
            processed_at: None,
            error: None,
            owner_id: None,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            processed: row.get("processed")?,
            processed_at: row.get("processed_at")?,
            error: row.get("error")?,
            owner_id: row.get("owner_id")?,
        })
    }
}

/// A raw reprocessing queue row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprocessingRow {
    pub id: i64,
    pub failed_record_id: i64,
    pub attempted_at: String,
    pub reprocessed: bool,
}

impl ReprocessingRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            failed_record_id: row.get("failed_record_id")?,
            attempted_at: row.get("attempted_at")?,
            reprocessed: row.get("reprocessed")?,
        })
    }
}

/// Inserts a post row. Returns `false` if a post with that id already exists.
pub fn insert(db: &Database, post: &PostRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO posts (id, title, description, processed, processed_at, error, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                post.id,
                post.title,
                post.description,
                post.processed,
                post.processed_at,
                post.error,
                post.owner_id,
            ],
        )?;
        Ok(inserted == 1)
    })
}

/// Returns the ids of posts that are not processed and carry no error,
/// in table scan order.
pub fn find_eligible_ids(db: &Database) -> Result<Vec<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id FROM posts WHERE processed = 0 AND (error IS NULL OR error = '')",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    })
}

/// Finds a post by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<PostRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM posts WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], PostRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Writes the enrichment for a post and marks it processed.
/// Returns the number of rows touched (0 if the id does not exist).
pub fn update_enrichment(
    db: &Database,
    id: i64,
    title: &str,
    description: &str,
    owner_id: i64,
    processed_at: &str,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE posts SET title = ?2, description = ?3, processed = 1,
             processed_at = ?4, owner_id = ?5
             WHERE id = ?1",
            params![id, title, description, processed_at, owner_id],
        )?;
        Ok(changed)
    })
}

/// Marks a post processed with an error message.
pub fn update_failed(
    db: &Database,
    id: i64,
    error: &str,
    processed_at: &str,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE posts SET processed = 1, processed_at = ?2, error = ?3 WHERE id = ?1",
            params![id, processed_at, error],
        )?;
        Ok(changed)
    })
}

/// Appends a reprocessing entry with `reprocessed = 0`. Returns the new row id.
pub fn insert_reprocessing(
    db: &Database,
    failed_record_id: i64,
    attempted_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO post_reprocessing (failed_record_id, attempted_at, reprocessed)
             VALUES (?1, ?2, 0)",
            params![failed_record_id, attempted_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Lists reprocessing entries that have not been reprocessed yet, oldest first.
pub fn find_pending_reprocessing(db: &Database) -> Result<Vec<ReprocessingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM post_reprocessing WHERE reprocessed = 0 ORDER BY attempted_at, id",
        )?;
        let rows = stmt
            .query_map([], ReprocessingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists every reprocessing entry for one post.
pub fn find_reprocessing_for(
    db: &Database,
    failed_record_id: i64,
) -> Result<Vec<ReprocessingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM post_reprocessing WHERE failed_record_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![failed_record_id], ReprocessingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        assert!(insert(&db, &PostRow::pending(1)).unwrap());

        let found = find_by_id(&db, 1).unwrap().unwrap();
        assert_eq!(found, PostRow::pending(1));
        assert!(find_by_id(&db, 2).unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_is_ignored() {
        let db = test_db();
        assert!(insert(&db, &PostRow::pending(1)).unwrap());
        assert!(!insert(&db, &PostRow::pending(1)).unwrap());
    }

    #[test]
    fn test_eligible_ids_exclude_processed_and_errored() {
        let db = test_db();
        insert(&db, &PostRow::pending(1)).unwrap();

        let mut done = PostRow::pending(2);
        done.processed = true;
        insert(&db, &done).unwrap();

        let mut errored = PostRow::pending(3);
        errored.error = Some("boom".to_string());
        insert(&db, &errored).unwrap();

        let mut empty_error = PostRow::pending(4);
        empty_error.error = Some(String::new());
        insert(&db, &empty_error).unwrap();

        let mut ids = find_eligible_ids(&db).unwrap();
        ids.sort();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_update_enrichment() {
        let db = test_db();
        insert(&db, &PostRow::pending(1)).unwrap();

        let changed =
            update_enrichment(&db, 1, "T", "B", 7, "2026-01-01T00:00:00+00:00").unwrap();
        assert_eq!(changed, 1);

        let post = find_by_id(&db, 1).unwrap().unwrap();
        assert_eq!(post.title, "T");
        assert_eq!(post.description, "B");
        assert_eq!(post.owner_id, Some(7));
        assert!(post.processed);
        assert_eq!(
            post.processed_at.as_deref(),
            Some("2026-01-01T00:00:00+00:00")
        );
        assert!(post.error.is_none());
    }

    #[test]
    fn test_update_enrichment_is_idempotent() {
        let db = test_db();
        insert(&db, &PostRow::pending(1)).unwrap();
        update_enrichment(&db, 1, "T", "B", 7, "2026-01-01T00:00:00+00:00").unwrap();
        update_enrichment(&db, 1, "T", "B", 7, "2026-01-01T00:00:00+00:00").unwrap();

        let post = find_by_id(&db, 1).unwrap().unwrap();
        assert_eq!(post.title, "T");
        assert_eq!(post.owner_id, Some(7));
    }

    #[test]
    fn test_update_missing_post_touches_nothing() {
        let db = test_db();
        assert_eq!(
            update_failed(&db, 42, "boom", "2026-01-01T00:00:00+00:00").unwrap(),
            0
        );
    }

    #[test]
    fn test_update_failed_keeps_content() {
        let db = test_db();
        let mut post = PostRow::pending(1);
        post.title = "old".to_string();
        insert(&db, &post).unwrap();

        update_failed(&db, 1, "status code 500", "2026-01-01T00:00:00+00:00").unwrap();

        let post = find_by_id(&db, 1).unwrap().unwrap();
        assert!(post.processed);
        assert_eq!(post.title, "old");
        assert_eq!(post.error.as_deref(), Some("status code 500"));
        assert!(find_eligible_ids(&db).unwrap().is_empty());
    }

    #[test]
    fn test_reprocessing_entries() {
        let db = test_db();
        let first = insert_reprocessing(&db, 5, "2026-01-02T00:00:00+00:00").unwrap();
        let second = insert_reprocessing(&db, 3, "2026-01-01T00:00:00+00:00").unwrap();
        insert_reprocessing(&db, 5, "2026-01-03T00:00:00+00:00").unwrap();
        assert_ne!(first, second);

        let pending = find_pending_reprocessing(&db).unwrap();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].failed_record_id, 3);
        assert!(pending.iter().all(|r| !r.reprocessed));

        let for_five = find_reprocessing_for(&db, 5).unwrap();
        assert_eq!(for_five.len(), 2);
        assert_eq!(for_five[0].attempted_at, "2026-01-02T00:00:00+00:00");
    }
}
