use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::persistence::repository::{CheckpointError, KeyValueStore};

const CHECKPOINT_SCHEMA_VERSION: i64 = 1;

const CHECKPOINT_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoint_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS checkpoint_values (
  key TEXT PRIMARY KEY,
  value INTEGER NOT NULL
);
"#;

/// SQLite-backed key/value store. Every write is committed before returning.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, CheckpointError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CheckpointError> {
        let mut db = Self { conn };
        db.conn.execute_batch(CHECKPOINT_DB_SCHEMA)?;
        db.ensure_meta()?;
        Ok(db)
    }

    fn ensure_meta(&mut self) -> Result<(), CheckpointError> {
        let version = self
            .conn
            .query_row(
                "SELECT schema_version FROM checkpoint_meta WHERE id = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match version {
            Some(CHECKPOINT_SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(CheckpointError::InvalidData(format!(
                "checkpoint_meta version mismatch (found {}, expected {})",
                other, CHECKPOINT_SCHEMA_VERSION
            ))),
            None => {
                self.conn.execute(
                    "INSERT INTO checkpoint_meta (id, schema_version) VALUES (1, ?1)",
                    params![CHECKPOINT_SCHEMA_VERSION],
                )?;
                Ok(())
            }
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get_int(&self, key: &str) -> Result<Option<i64>, CheckpointError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM checkpoint_values WHERE key = ?1",
                params![key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), CheckpointError> {
        self.conn.execute(
            "INSERT INTO checkpoint_values (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CheckpointError> {
        self.conn
            .execute("DELETE FROM checkpoint_values WHERE key = ?1", params![key])?;
        Ok(())
    }
}
