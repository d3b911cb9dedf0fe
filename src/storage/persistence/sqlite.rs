//! `SQLite` persistence gateway.
//!
//! A single `kv` table keyed by storage key. Saves are upserts, so each one
//! replaces the previous value atomically.

use crate::storage::traits::PersistenceGateway;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Gateway backed by a `SQLite` database.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteGateway {
    /// Opens (or creates) the database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::persistence("create_db_dir", e))?;
        }
        let conn = Connection::open(&db_path).map_err(|e| Error::persistence("open_sqlite", e))?;

        let gateway = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        gateway.initialize()?;
        Ok(gateway)
    }

    /// Creates an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::persistence("open_sqlite_memory", e))?;

        let gateway = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        gateway.initialize()?;
        Ok(gateway)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::persistence("lock_sqlite", e))
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        // journal_mode returns a row, so it goes through pragma_update_and_check
        let _ = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        });
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| Error::persistence("init_sqlite_schema", e))
    }
}

impl PersistenceGateway for SqliteGateway {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, Vec<u8>>(0)
        })
        .optional()
        .map_err(|e| Error::persistence("sqlite_load", e))
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )
        .map(|_| ())
        .map_err(|e| Error::persistence("sqlite_save", e))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_upsert() {
        let gateway = SqliteGateway::in_memory().unwrap();
        assert!(gateway.db_path().is_none());
        assert!(gateway.load("quotes").unwrap().is_none());

        gateway.save("quotes", b"[1]").unwrap();
        gateway.save("quotes", b"[2]").unwrap();
        assert_eq!(gateway.load("quotes").unwrap(), Some(b"[2]".to_vec()));
    }

    #[test]
    fn test_file_backed_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("quotes.db");
        {
            let gateway = SqliteGateway::new(&path).unwrap();
            gateway.save("lastSelectedCategory", b"life").unwrap();
        }
        let gateway = SqliteGateway::new(&path).unwrap();
        assert_eq!(
            gateway.load("lastSelectedCategory").unwrap(),
            Some(b"life".to_vec())
        );
    }
}
