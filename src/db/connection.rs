use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::api::ApiError;
use crate::db::schema::SchemaMigrator;

/// Local SQLite file holding the key/value store and the offline caches
pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        log::info!("Opening local database at {}", db_path.display());
        Self::migrate(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::migrate(Connection::open_in_memory()?)
    }

    fn migrate(mut conn: Connection) -> Result<Self> {
        let report = SchemaMigrator::default().upgrade(&mut conn)?;
        if report.applied > 0 {
            log::info!("Local schema upgraded to version {}", report.version);
        } else {
            log::debug!("Local schema is at version {}", report.version);
        }

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, ApiError> {
        self.conn
            .lock()
            .map_err(|e| ApiError::StorageError(format!("Database lock poisoned: {}", e)))
    }
}
