use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use super::connection::Database;
use crate::api::ApiError;

/// String key/value store with the semantics of the browser's localStorage
#[derive(Clone)]
pub struct LocalStorage {
    db: Arc<Database>,
}

impl LocalStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, ApiError> {
        let conn = self.db.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), ApiError> {
        let conn = self.db.lock()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?", [key])?;
        Ok(())
    }
}
