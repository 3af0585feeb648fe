use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::model::{LinkKind, RecordKind};

use super::migrations::MIGRATIONS;

/// Per-connection pragmas, applied before migrations.
const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Connection options for [`Index::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// How long a writer waits for the database lock before failing.
    pub busy_timeout: Duration,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// The provenance index: one SQLite connection holding sources, identifiers,
/// assignments, records and links.
///
/// Several `Index` values may be opened on the same file; writes from each
/// are serialised by SQLite.
#[derive(Debug)]
pub struct Index {
    pub(crate) conn: Connection,
}

impl Index {
    /// Open (or create) an index at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>, options: IndexOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        Self::init(conn)
    }

    /// Open an in-memory index (for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(PRAGMAS)?;
        let mut index = Self { conn };
        index.apply_migrations()?;
        Ok(index)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Start a write transaction that takes the write lock up front.
    pub(crate) fn begin_write(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    fn apply_migrations(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let applied = self.applied_versions()?;

        for migration in MIGRATIONS {
            if applied.contains(&migration.version) {
                continue;
            }
            log::info!(
                "Applying migration {} ({})",
                migration.version,
                migration.name
            );
            let tx = self.begin_write()?;
            tx.execute_batch(migration.sql)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                rusqlite::params![migration.version, migration.name],
            )?;
            tx.commit()?;
        }

        Ok(())
    }

    fn applied_versions(&self) -> Result<Vec<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let versions = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(versions)
    }

    /// Version of the newest applied migration.
    pub fn schema_version(&self) -> Result<u32> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?)
    }

    /// Row counts for every table in the index.
    pub fn stats(&self) -> Result<IndexStats> {
        let records = RecordKind::ALL
            .iter()
            .map(|&kind| Ok((kind, self.count(kind.as_str())?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let links = LinkKind::ALL
            .iter()
            .map(|&kind| Ok((kind, self.count(kind.as_str())?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(IndexStats {
            sources: self.count("source")?,
            identifiers: self.count("identifier")?,
            assignments: self.count("identifier_assignment")?,
            records,
            links,
        })
    }

    fn count(&self, table: &str) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                    row.get(0)
                })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub sources: u64,
    pub identifiers: u64,
    pub assignments: u64,
    pub records: BTreeMap<RecordKind, u64>,
    pub links: BTreeMap<LinkKind, u64>,
}

impl IndexStats {
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.records.values().sum()
    }

    #[must_use]
    pub fn total_links(&self) -> u64 {
        self.links.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_open_in_memory() {
        let index = Index::open_in_memory().unwrap();
        let count: i64 = index
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, i64::try_from(MIGRATIONS.len()).unwrap());
        assert_eq!(index.schema_version().unwrap(), 3);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let index = Index::open_in_memory().unwrap();
        let enabled: i64 = index
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_every_kind_has_a_table() {
        let index = Index::open_in_memory().unwrap();
        let stats = index.stats().unwrap();
        assert_eq!(stats.records.len(), RecordKind::ALL.len());
        assert_eq!(stats.links.len(), LinkKind::ALL.len());
        assert_eq!(stats.total_records(), 0);
        assert_eq!(stats.total_links(), 0);
    }

    #[test]
    fn test_share_columns_added() {
        let index = Index::open_in_memory().unwrap();
        for table in ["composer_work", "publisher_work"] {
            let mut stmt = index
                .conn()
                .prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))
                .unwrap();
            let columns: Vec<String> = stmt
                .query_map([], |row| row.get(0))
                .unwrap()
                .collect::<rusqlite::Result<_>>()
                .unwrap();
            for column in ["role", "pr_share", "mr_share", "sr_share"] {
                assert!(columns.iter().any(|c| c == column), "{table}.{column}");
            }
        }
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("polyphon.db");

        let index = Index::open(&path, IndexOptions::default()).unwrap();
        drop(index);

        let index = Index::open(&path, IndexOptions::default()).unwrap();
        let count: i64 = index
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 3);

        let mode: String = index
            .conn()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
