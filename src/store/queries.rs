use rusqlite::{ErrorCode, OptionalExtension, Row, params};
use tracing::info;
use uuid::Uuid;

use super::SavedQueryStore;
use crate::error::StorageError;
use crate::models::SavedQuery;

const SELECT_COLUMNS: &str = "SELECT Id, Name, QueryText FROM SavedQueries";

/// Raw row; the id is parsed after the statement finishes so a bad value can
/// be reported as [`StorageError::CorruptId`].
struct SavedQueryRow {
    id: String,
    name: String,
    query_text: String,
}

impl SavedQueryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SavedQueryRow {
            id: row.get(0)?,
            name: row.get(1)?,
            query_text: row.get(2)?,
        })
    }

    fn into_saved_query(self) -> Result<SavedQuery, StorageError> {
        let id = Uuid::parse_str(&self.id).map_err(|source| StorageError::CorruptId {
            value: self.id.clone(),
            source,
        })?;
        Ok(SavedQuery {
            id,
            name: self.name,
            query_text: self.query_text,
        })
    }
}

impl SavedQueryStore {
    /// Inserts a new query. Fails with [`StorageError::DuplicateId`] when the
    /// id is already stored.
    pub fn add_saved_query(&self, query: &SavedQuery) -> Result<(), StorageError> {
        let result = self.connection()?.execute(
            "INSERT INTO SavedQueries (Id, Name, QueryText) VALUES (?1, ?2, ?3)",
            params![query.id.to_string(), query.name, query.query_text],
        );

        match result {
            Ok(_) => {
                info!(id = %query.id, name = %query.name, "saved query added");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateId { id: query.id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All saved queries in insertion order.
    pub fn get_saved_queries(&self) -> Result<Vec<SavedQuery>, StorageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid"))?;
        let rows = stmt
            .query_map([], SavedQueryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(SavedQueryRow::into_saved_query)
            .collect()
    }

    pub fn get_saved_query(&self, id: Uuid) -> Result<Option<SavedQuery>, StorageError> {
        self.connection()?
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE Id = ?1"),
                params![id.to_string()],
                SavedQueryRow::from_row,
            )
            .optional()?
            .map(SavedQueryRow::into_saved_query)
            .transpose()
    }

    /// First query (in insertion order) with exactly this name.
    pub fn find_by_name(&self, name: &str) -> Result<Option<SavedQuery>, StorageError> {
        self.connection()?
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE Name = ?1 ORDER BY rowid LIMIT 1"),
                params![name],
                SavedQueryRow::from_row,
            )
            .optional()?
            .map(SavedQueryRow::into_saved_query)
            .transpose()
    }

    /// Overwrites name and text of the query with the same id.
    ///
    /// Returns `false` when no such query exists.
    pub fn update_saved_query(&self, query: &SavedQuery) -> Result<bool, StorageError> {
        let changed = self.connection()?.execute(
            "UPDATE SavedQueries SET Name = ?1, QueryText = ?2 WHERE Id = ?3",
            params![query.name, query.query_text, query.id.to_string()],
        )?;
        if changed > 0 {
            info!(id = %query.id, name = %query.name, "saved query updated");
        }
        Ok(changed > 0)
    }

    /// Returns `false` when no such query exists.
    pub fn delete_saved_query(&self, id: Uuid) -> Result<bool, StorageError> {
        let changed = self
            .connection()?
            .execute("DELETE FROM SavedQueries WHERE Id = ?1", params![id.to_string()])?;
        if changed > 0 {
            info!(id = %id, "saved query deleted");
        }
        Ok(changed > 0)
    }
}
