//! SQLite persistence: schema management, typed repository, retention.
//!
//! Every operation opens its own connection and drops it when done. The
//! collector is the only writer, so there is never more than one connection
//! in flight.

pub mod repository;
pub mod retention;
pub mod schema;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;
use tracing::info;

pub use repository::{HostInsert, QueryRow, Repository};
pub use retention::RetentionPolicy;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error("refusing to run a statement that writes: {0}")]
    NotReadOnly(String),
}

/// Handle to the on-disk store. Cheap to clone; holds only the path.
#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the database file if present and create a fresh, empty one.
    ///
    /// Destroys all prior history. Only call at controlled startup.
    pub fn reset_store(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "existing store deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        }
        self.ensure_parent_dir()?;
        drop(self.connect()?);
        info!(path = %self.path.display(), "store created");
        Ok(())
    }

    /// Create all tables that do not exist yet. Existing data is untouched.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.ensure_parent_dir()?;
        let conn = self.connect()?;
        conn.execute_batch(schema::SCHEMA_DDL)?;
        info!("tables ensured");
        Ok(())
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(schema::PRAGMAS)?;
        Ok(conn)
    }

    /// Open without create or write access. Fails if the database is missing.
    pub(crate) fn connect_read_only(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(schema::PRAGMAS)?;
        Ok(conn)
    }

    fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Table names accepted by the generic per-table helpers.
pub(crate) fn checked_table(table: &str) -> Result<&'static str, StoreError> {
    schema::TABLES
        .iter()
        .copied()
        .find(|known| *known == table)
        .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("db").join("metrik.db"));
        (dir, store)
    }

    fn table_count(store: &Store) -> i64 {
        store
            .connect()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn reset_creates_missing_parent_dirs() {
        let (_dir, store) = temp_store();
        store.reset_store().unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn reset_discards_existing_tables() {
        let (_dir, store) = temp_store();
        store.reset_store().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(table_count(&store), 6);

        store.reset_store().unwrap();
        assert_eq!(table_count(&store), 0);
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let (_dir, store) = temp_store();
        store.ensure_schema().unwrap();
        store
            .connect()
            .unwrap()
            .execute(
                "INSERT INTO Host (id, os, code_name, version, cpu_signature, physical_cores, vendor_frequency_hz) \
                 VALUES (1, 'Linux', '', '6.1', 'cpu', 2, 1)",
                [],
            )
            .unwrap();

        store.ensure_schema().unwrap();
        assert_eq!(table_count(&store), 6);
        let hosts: i64 = store
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM Host", [], |row| row.get(0))
            .unwrap();
        assert_eq!(hosts, 1);
    }

    #[test]
    fn checked_table_rejects_unknown_names() {
        assert_eq!(checked_table("Host").unwrap(), "Host");
        assert!(matches!(
            checked_table("Host; DROP TABLE Host"),
            Err(StoreError::UnknownTable(_))
        ));
    }
}
