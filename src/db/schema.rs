use rusqlite::{params, Connection, OptionalExtension, Result};
use sha2::{Digest, Sha256};

/// One forward-only schema step
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Step {
    fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(self.sql.as_bytes()))
    }
}

/// Local schema, oldest first. Versions start at 1 and have no gaps.
pub const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "local_storage",
        sql: include_str!("migrations/001_local_storage.sql"),
    },
    Step {
        version: 2,
        name: "offline_cache",
        sql: include_str!("migrations/002_offline_cache.sql"),
    },
];

const BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    checksum TEXT NOT NULL,
    applied_at INTEGER NOT NULL
)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeReport {
    pub applied: usize,
    pub version: u32,
}

/// Brings the local database up to the latest schema.
///
/// Already-applied steps are checked against their stored checksum first,
/// so an edited step stops the upgrade instead of silently diverging.
pub struct SchemaMigrator {
    steps: &'static [Step],
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        Self { steps: STEPS }
    }
}

impl SchemaMigrator {
    #[cfg(test)]
    fn with_steps(steps: &'static [Step]) -> Self {
        Self { steps }
    }

    pub fn upgrade(&self, conn: &mut Connection) -> Result<UpgradeReport> {
        conn.execute_batch(BOOKKEEPING)?;
        self.verify(conn)?;

        let current = self.version(conn)?;
        let mut applied = 0;
        for step in self.steps.iter().filter(|s| s.version > current) {
            let tx = conn.transaction()?;
            if let Err(e) = tx.execute_batch(step.sql) {
                log::error!("Schema step {} ({}) failed: {}", step.version, step.name, e);
                return Err(e);
            }
            tx.execute(
                "INSERT INTO schema_version (version, name, checksum, applied_at) VALUES (?, ?, ?, ?)",
                params![step.version, step.name, step.checksum(), chrono::Utc::now().timestamp()],
            )?;
            tx.commit()?;
            log::info!("Applied schema step {} ({})", step.version, step.name);
            applied += 1;
        }

        Ok(UpgradeReport {
            applied,
            version: self.version(conn)?,
        })
    }

    /// Highest applied version, 0 for an empty database
    pub fn version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(version.unwrap_or(0))
    }

    fn verify(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare("SELECT version, checksum FROM schema_version ORDER BY version")?;
        let stored = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>>>()?;

        for (version, checksum) in stored {
            let Some(step) = self.steps.iter().find(|s| s.version == version) else {
                log::error!("Database has schema version {} which this build does not know", version);
                return Err(rusqlite::Error::InvalidQuery);
            };
            if step.checksum() != checksum {
                log::error!("Schema step {} ({}) was changed after it was applied", version, step.name);
                return Err(rusqlite::Error::InvalidQuery);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            params![table],
            |row| row.get::<_, i32>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_versions_are_sequential() {
        for (i, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, i + 1);
        }
    }

    #[test]
    fn test_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = SchemaMigrator::default().upgrade(&mut conn).unwrap();

        assert_eq!(report, UpgradeReport { applied: 2, version: 2 });
        assert!(table_exists(&conn, "local_storage"));
        assert!(table_exists(&conn, "cache_entries"));
    }

    #[test]
    fn test_second_upgrade_is_noop() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = SchemaMigrator::default();
        migrator.upgrade(&mut conn).unwrap();

        assert_eq!(migrator.upgrade(&mut conn).unwrap().applied, 0);
    }

    #[test]
    fn test_edited_step_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = SchemaMigrator::default();
        migrator.upgrade(&mut conn).unwrap();

        conn.execute("UPDATE schema_version SET checksum = 'deadbeef' WHERE version = 1", [])
            .unwrap();

        assert!(migrator.upgrade(&mut conn).is_err());
    }

    #[test]
    fn test_failed_step_rolls_back() {
        static BROKEN: &[Step] = &[
            Step {
                version: 1,
                name: "ok",
                sql: "CREATE TABLE a (x INTEGER);",
            },
            Step {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE b (x INTEGER); NOT SQL AT ALL",
            },
        ];
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = SchemaMigrator::with_steps(BROKEN);

        assert!(migrator.upgrade(&mut conn).is_err());
        assert_eq!(migrator.version(&conn).unwrap(), 1);
        assert!(table_exists(&conn, "a"));
        assert!(!table_exists(&conn, "b"));
    }
}
