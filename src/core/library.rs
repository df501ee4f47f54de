//! Validated access to the saved query store.

use tracing::debug;
use uuid::Uuid;

use crate::error::{DevOpsError, DevOpsResult, ValidationError};
use crate::models::SavedQuery;
use crate::store::SavedQueryStore;

/// Saved query operations with the checks the raw store leaves out:
/// names and texts must not be blank and names must be unique.
pub struct QueryLibrary<'a> {
    store: &'a SavedQueryStore,
}

impl<'a> QueryLibrary<'a> {
    pub fn new(store: &'a SavedQueryStore) -> Self {
        Self { store }
    }

    pub fn list(&self) -> DevOpsResult<Vec<SavedQuery>> {
        Ok(self.store.get_saved_queries()?)
    }

    pub fn find(&self, name: &str) -> DevOpsResult<Option<SavedQuery>> {
        Ok(self.store.find_by_name(name.trim())?)
    }

    /// Like [`find`](Self::find) but a missing name is an error.
    pub fn get(&self, name: &str) -> DevOpsResult<SavedQuery> {
        self.find(name)?.ok_or_else(|| {
            ValidationError::UnknownQuery {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Stores a new query under a fresh id.
    pub fn save(&self, name: &str, query_text: &str) -> DevOpsResult<SavedQuery> {
        let name = validate_name(name)?;
        validate_text(query_text)?;
        self.ensure_name_free(name, None)?;

        let query = SavedQuery::new(name, query_text);
        self.store.add_saved_query(&query)?;
        Ok(query)
    }

    /// Applies a new name and/or text to the query with this id.
    ///
    /// Returns `None` when the id is unknown.
    pub fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        query_text: Option<&str>,
    ) -> DevOpsResult<Option<SavedQuery>> {
        let Some(mut query) = self.store.get_saved_query(id)? else {
            debug!(%id, "update of unknown saved query ignored");
            return Ok(None);
        };

        if let Some(name) = name {
            let name = validate_name(name)?;
            self.ensure_name_free(name, Some(id))?;
            query.name = name.to_string();
        }
        if let Some(text) = query_text {
            validate_text(text)?;
            query.query_text = text.to_string();
        }

        Ok(self.store.update_saved_query(&query)?.then_some(query))
    }

    pub fn delete(&self, id: Uuid) -> DevOpsResult<bool> {
        Ok(self.store.delete_saved_query(id)?)
    }

    fn ensure_name_free(&self, name: &str, owner: Option<Uuid>) -> DevOpsResult<()> {
        match self.store.find_by_name(name)? {
            Some(existing) if Some(existing.id) != owner => Err(DevOpsError::Validation(
                ValidationError::DuplicateName {
                    name: name.to_string(),
                },
            )),
            _ => Ok(()),
        }
    }
}

fn validate_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name)
}

fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQueryText);
    }
    Ok(())
}
