//! Runs a WIQL query and loads the details of every returned work item.
//!
//! Failures after the query text is accepted never abort the run: they turn
//! into placeholder rows so the caller always has something to list.

use tracing::{debug, info, warn};

use crate::api::WorkItemQueries;
use crate::error::ApiError;
use crate::models::WorkItemViewModel;

/// Name of the query offered when the library is empty.
pub const DEFAULT_QUERY_NAME: &str = "Committed WorkItems";

/// Committed work items in the configured area path.
pub const DEFAULT_QUERY_TEXT: &str = "SELECT [System.Id], [System.Title] FROM WorkItems WHERE [System.State] = 'Committed' AND [System.AreaPath] = '@AREAPATH@' ORDER BY [System.Id]";

/// Id used by placeholder rows that do not belong to a work item.
pub const ERROR_ID: &str = "Error";
pub const NO_WORK_ITEMS_TITLE: &str = "No work items found";
pub const QUERY_FAILED_TITLE: &str = "Error executing query";
pub const DETAILS_FAILED_TITLE: &str = "Error fetching details";

/// Whether a row stands in for something that failed to load.
pub fn is_placeholder(item: &WorkItemViewModel) -> bool {
    item.fields.is_empty()
        && matches!(
            item.title.as_deref(),
            Some(NO_WORK_ITEMS_TITLE | QUERY_FAILED_TITLE | DETAILS_FAILED_TITLE)
        )
}

pub struct QueryRunner<'a, C: WorkItemQueries + ?Sized> {
    client: &'a C,
}

impl<'a, C: WorkItemQueries + ?Sized> QueryRunner<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Substitutes the area path, runs the query, then fetches each work item
    /// in result order, one request at a time.
    ///
    /// Only blank query text is an error. Everything else degrades:
    /// - an unparsable query response gives one `No work items found` row
    /// - any other query failure gives one `Error executing query` row
    /// - a failing work item gives `{id}: Error fetching details` and the run continues
    pub async fn run(&self, template: &str) -> Result<Vec<WorkItemViewModel>, ApiError> {
        if template.trim().is_empty() {
            return Err(ApiError::InvalidQuery);
        }

        let query = self.client.replace_area_path(template);
        if query.trim().is_empty() {
            return Err(ApiError::InvalidQuery);
        }
        debug!(query = %query, "running query");

        let refs = match self.client.execute_query(&query).await {
            Ok(refs) => refs,
            Err(ApiError::InvalidQuery) => return Err(ApiError::InvalidQuery),
            Err(e @ ApiError::ParseError { .. }) => {
                warn!(error = %e, "query response could not be read");
                return Ok(vec![WorkItemViewModel::placeholder(
                    ERROR_ID,
                    NO_WORK_ITEMS_TITLE,
                )]);
            }
            Err(e) => {
                warn!(error = %e, "query failed");
                return Ok(vec![WorkItemViewModel::placeholder(
                    ERROR_ID,
                    QUERY_FAILED_TITLE,
                )]);
            }
        };

        let mut items = Vec::with_capacity(refs.len());
        for work_item in refs {
            match self.client.fetch_work_item_details(&work_item.id).await {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(id = %work_item.id, error = %e, "failed to fetch work item");
                    items.push(WorkItemViewModel::placeholder(
                        work_item.id,
                        DETAILS_FAILED_TITLE,
                    ));
                }
            }
        }

        info!(count = items.len(), "query finished");
        Ok(items)
    }
}
