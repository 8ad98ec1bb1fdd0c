//! Database module for persistent storage.
//!
//! Uses rusqlite (SQLite). A file-backed `Database` opens a fresh
//! connection for every logical operation, so no transaction ever spans
//! more than one statement group. The in-memory variant keeps a single
//! connection behind a `Mutex`, since an in-memory database is dropped
//! together with its last connection.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod migrations;
pub mod post_repo;

pub use error::DatabaseError;

#[derive(Clone)]
enum Backend {
    File(PathBuf),
    Memory(Arc<Mutex<Connection>>),
}

/// Database handle. Cloning is cheap.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            backend: Backend::File(path.to_path_buf()),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;

        migrations::run_all(&conn)?;

        Ok(Self {
            backend: Backend::Memory(Arc::new(Mutex::new(conn))),
        })
    }

    /// Runs `f` against a connection. File databases get a connection
    /// opened for this call only and closed when it returns.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        match &self.backend {
            Backend::File(path) => {
                let conn = Connection::open_with_flags(
                    path,
                    rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                        | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                f(&conn)
            }
            Backend::Memory(shared) => {
                let conn = shared.lock().map_err(|_| DatabaseError::LockPoisoned)?;
                f(&conn)
            }
        }
    }

    /// Returns the backing file path, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }
}

/// Returns the canonical database path: `~/.postsync/data/postsync.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".postsync").join("data").join("postsync.db"))
}
