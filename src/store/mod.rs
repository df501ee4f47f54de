//! SQLite persistence for saved queries.
//!
//! Every operation opens its own connection and drops it when done, so the
//! store holds nothing but the database location.

mod queries;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StorageError;

#[derive(Debug, Clone)]
pub struct SavedQueryStore {
    path: PathBuf,
}

impl SavedQueryStore {
    /// Opens the database at `path`, creating the file and the table if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = SavedQueryStore { path: path.into() };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<Connection, StorageError> {
        debug!(path = %self.path.display(), "opening saved query database");
        Ok(Connection::open(&self.path)?)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.connection()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS SavedQueries (
                Id TEXT PRIMARY KEY,
                Name TEXT NOT NULL,
                QueryText TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}
