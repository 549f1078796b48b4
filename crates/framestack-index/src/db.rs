use std::path::Path;

use rusqlite::Connection;

use crate::schema;
use crate::Result;

/// SQLite-backed adapter. Opens a single-file database (or an in-memory one
/// for tests) and owns the one connection used by this process; statement
/// preparation happens per call, transactions wrap any write spanning more
/// than one table.
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    /// Run `f` inside a transaction; committed on `Ok`, rolled back on `Err`
    /// or panic. Every multi-table write (closing a frame updates the frame
    /// row, writes the digest, and may append a final event) goes through
    /// this.
    pub fn in_transaction<T>(
        &mut self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute("VACUUM", [])?;
        Ok(())
    }

    /// The underlying connection, for read-only query calls that don't need
    /// a transaction.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
