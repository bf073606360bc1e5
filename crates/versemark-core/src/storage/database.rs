//! SQLite connection handling
//!
//! A `Database` owns one connection behind a mutex. Every operation holds
//! the lock for its whole duration, and every write runs in an IMMEDIATE
//! transaction, so readers never observe a half-applied mutation and
//! check-then-act sequences cannot interleave.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::info;

use super::error::StoreResult;
use super::schema::{init_schema, needs_init};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the bookmark database
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the SQLite database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {:?}", path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self::from_connection(conn).context("Failed to initialize SQLite schema")?;
        info!("Opened bookmark database at {:?}", path);
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if needs_init(&conn) {
            init_schema(&conn)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a read-only operation
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.lock();
        f(&conn)
    }

    /// Run a mutating operation as one atomic unit
    ///
    /// The transaction commits only when `f` succeeds; any error rolls
    /// back everything `f` did.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-operation leaves no open transaction behind: the
        // Transaction guard rolls back on drop.
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
