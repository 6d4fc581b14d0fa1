use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::api::ApiError;
use crate::db::Database;

/// Response as kept in the offline cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn ok(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }
}

/// Named response caches stored in the `cache_entries` table
#[derive(Clone)]
pub struct CacheStorage {
    db: Arc<Database>,
}

impl CacheStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn put(&self, cache_name: &str, url: &str, response: &CachedResponse) -> Result<(), ApiError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO cache_entries (cache_name, url, status, content_type, body, stored_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(cache_name, url) DO UPDATE SET
                status = excluded.status,
                content_type = excluded.content_type,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                cache_name,
                url,
                response.status,
                response.content_type,
                response.body,
                chrono::Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    pub fn lookup(&self, cache_name: &str, url: &str) -> Result<Option<CachedResponse>, ApiError> {
        let conn = self.db.lock()?;
        let entry = conn
            .query_row(
                "SELECT status, content_type, body FROM cache_entries WHERE cache_name = ? AND url = ?",
                params![cache_name, url],
                |row| {
                    Ok(CachedResponse {
                        status: row.get(0)?,
                        content_type: row.get(1)?,
                        body: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    pub fn cache_names(&self) -> Result<Vec<String>, ApiError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Drop a whole cache; returns the number of entries removed
    pub fn delete_cache(&self, cache_name: &str) -> Result<usize, ApiError> {
        let conn = self.db.lock()?;
        Ok(conn.execute("DELETE FROM cache_entries WHERE cache_name = ?", [cache_name])?)
    }

    pub fn entry_count(&self, cache_name: &str) -> Result<usize, ApiError> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE cache_name = ?",
            [cache_name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
