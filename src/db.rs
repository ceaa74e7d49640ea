use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ActionError, ActionResult};

/// Shared handle to the backoffice database.
///
/// Wraps a single SQLite connection behind a mutex; clones share the
/// connection. All schema setup happens on open, so a handle is always
/// backed by a fully-created schema.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `database_path` and ensure the schema.
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and local experiments.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS languages (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                name       TEXT NOT NULL UNIQUE,
                code       TEXT NOT NULL UNIQUE,
                is_default INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .context("Failed to create languages table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_type TEXT NOT NULL,
                entity_id   INTEGER NOT NULL,
                field       TEXT NOT NULL,
                language_id INTEGER NOT NULL REFERENCES languages(id),
                value       TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                UNIQUE(entity_type, entity_id, field, language_id)
            )",
            [],
        )
        .context("Failed to create translations table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS presale_artworks (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                artist_id     INTEGER NOT NULL,
                title         TEXT NOT NULL,
                display_order INTEGER,
                created_at    TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create presale_artworks table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the shared connection for a sequence of statements.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Run `f` inside an exclusive transaction. Any error rolls everything
    /// back; the error is returned unchanged.
    pub(crate) fn with_tx<T>(
        &self,
        f: impl FnOnce(&Connection) -> ActionResult<T>,
    ) -> ActionResult<T> {
        let conn = self.conn();
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(ActionError::Persistence)?;

        match f(&conn) {
            Ok(value) => {
                conn.execute_batch("COMMIT")
                    .map_err(ActionError::Persistence)?;
                Ok(value)
            }
            Err(e) => {
                // Rollback failure is secondary; the original error wins.
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_creation() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("backoffice.db");
        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to create database");

        // All three tables should exist and be empty
        let conn = db.conn();
        for table in ["languages", "translations", "presale_artworks"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .expect("table should exist");
            assert_eq!(count, 0, "{} should start empty", table);
        }
    }

    #[test]
    fn test_database_reopening() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("backoffice.db");
        let path_str = db_path.to_str().unwrap();

        {
            let db = Database::new(path_str).expect("create");
            db.conn()
                .execute(
                    "INSERT INTO languages (name, code, is_default) VALUES ('English', 'en', 1)",
                    [],
                )
                .expect("insert");
        }

        {
            let db = Database::new(path_str).expect("reopen");
            let count: i64 = db
                .conn()
                .query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))
                .expect("count");
            assert_eq!(count, 1, "Data should persist across reopen");
        }
    }

    #[test]
    fn test_invalid_database_path() {
        let result = Database::new("/non/existent/path/backoffice.db");
        assert!(result.is_err());
    }

    #[test]
    fn test_database_clone_shares_connection() {
        let db = Database::open_in_memory().expect("open");
        let db_clone = db.clone();

        db.conn()
            .execute(
                "INSERT INTO languages (name, code, is_default) VALUES ('English', 'en', 1)",
                [],
            )
            .expect("insert");

        let count: i64 = db_clone
            .conn()
            .query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_with_tx_commits_on_ok() {
        let db = Database::open_in_memory().expect("open");

        db.with_tx(|conn| {
            conn.execute(
                "INSERT INTO languages (name, code, is_default) VALUES ('English', 'en', 0)",
                [],
            )?;
            Ok(())
        })
        .expect("tx should commit");

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_with_tx_rolls_back_on_err() {
        let db = Database::open_in_memory().expect("open");

        let result: ActionResult<()> = db.with_tx(|conn| {
            conn.execute(
                "INSERT INTO languages (name, code, is_default) VALUES ('English', 'en', 0)",
                [],
            )?;
            Err(ActionError::Validation("forced failure".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0, "Rolled-back insert should not be visible");
    }

    #[test]
    fn test_translations_unique_index() {
        let db = Database::open_in_memory().expect("open");
        let conn = db.conn();

        conn.execute(
            "INSERT INTO languages (name, code, is_default) VALUES ('English', 'en', 1)",
            [],
        )
        .expect("language");

        conn.execute(
            "INSERT INTO translations (entity_type, entity_id, field, language_id, value, updated_at)
             VALUES ('Faq', 1, 'question', 1, 'What?', '2024-01-01T00:00:00Z')",
            [],
        )
        .expect("first insert");

        // A plain duplicate insert must hit the UNIQUE index
        let dup = conn.execute(
            "INSERT INTO translations (entity_type, entity_id, field, language_id, value, updated_at)
             VALUES ('Faq', 1, 'question', 1, 'Again?', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(dup.is_err(), "Duplicate 4-tuple should be rejected");
    }
}
