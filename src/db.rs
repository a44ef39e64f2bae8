use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;

const SCHEMA_VERSION: i32 = 1;

/// The one well-known key the session token lives under.
pub const TOKEN_KEY: &str = "access_token";

/// Durable client state: a small key/value table in a local SQLite file.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap_or(0);

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS client_state (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )?;

            self.conn
                .execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM client_state WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }

    // Session token
    pub fn token(&self) -> Result<Option<String>> {
        self.get(TOKEN_KEY)
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        self.set(TOKEN_KEY, token)
    }

    /// Cleared wholesale; absent is not an error.
    pub fn clear_token(&self) -> Result<()> {
        self.remove(TOKEN_KEY)?;
        Ok(())
    }
}
