//! Trait for the Azure DevOps work item operations.
//!
//! The query runner only talks to this trait, so it can be driven by a mock
//! in tests.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{WorkItemRef, WorkItemViewModel};

/// Work item operations against a single organization/project.
#[async_trait]
pub trait WorkItemQueries: Send + Sync {
    /// Runs a WIQL query and returns the referenced work items in result order.
    async fn execute_query(&self, query: &str) -> Result<Vec<WorkItemRef>, ApiError>;

    /// Fetches one work item with its fields and plain-text description.
    async fn fetch_work_item_details(&self, id: &str) -> Result<WorkItemViewModel, ApiError>;

    /// Replaces every `@AREAPATH@` in `template` with the configured area path.
    fn replace_area_path(&self, template: &str) -> String;
}

#[cfg(test)]
pub mod mocks {
    //! Mock implementations for testing.

    use super::*;
    use crate::models::AREA_PATH_TOKEN;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Mock implementation for work item operations.
    #[derive(Default)]
    pub struct MockWorkItemQueries {
        /// Area path used by replace_area_path.
        pub area_path: String,
        /// Pre-configured response for execute_query.
        pub execute_query_response: Arc<Mutex<Option<Result<Vec<WorkItemRef>, ApiError>>>>,
        /// Pre-configured responses for fetch_work_item_details, keyed by id.
        /// Ids without an entry fail with NotFound.
        pub details: Arc<Mutex<HashMap<String, Result<WorkItemViewModel, ApiError>>>>,
        /// Queries passed to execute_query, in call order.
        pub executed_queries: Arc<Mutex<Vec<String>>>,
        /// Ids passed to fetch_work_item_details, in call order.
        pub fetched_ids: Arc<Mutex<Vec<String>>>,
    }

    impl MockWorkItemQueries {
        pub fn new(area_path: &str) -> Self {
            Self {
                area_path: area_path.to_string(),
                ..Self::default()
            }
        }

        /// Sets the response for execute_query.
        pub async fn set_execute_query_response(
            &self,
            response: Result<Vec<WorkItemRef>, ApiError>,
        ) {
            *self.execute_query_response.lock().await = Some(response);
        }

        /// Sets a successful detail response with the given title.
        pub async fn set_details(&self, id: &str, title: &str) {
            let item = WorkItemViewModel {
                id: id.to_string(),
                title: Some(title.to_string()),
                ..WorkItemViewModel::default()
            };
            self.details.lock().await.insert(id.to_string(), Ok(item));
        }

        /// Sets a failing detail response.
        pub async fn set_details_error(&self, id: &str, error: ApiError) {
            self.details.lock().await.insert(id.to_string(), Err(error));
        }
    }

    #[async_trait]
    impl WorkItemQueries for MockWorkItemQueries {
        async fn execute_query(&self, query: &str) -> Result<Vec<WorkItemRef>, ApiError> {
            self.executed_queries.lock().await.push(query.to_string());
            self.execute_query_response
                .lock()
                .await
                .take()
                .unwrap_or_else(|| Ok(vec![]))
        }

        async fn fetch_work_item_details(&self, id: &str) -> Result<WorkItemViewModel, ApiError> {
            self.fetched_ids.lock().await.push(id.to_string());
            self.details
                .lock()
                .await
                .remove(id)
                .unwrap_or_else(|| {
                    Err(ApiError::NotFound {
                        url: format!("mock://workitems/{id}"),
                    })
                })
        }

        fn replace_area_path(&self, template: &str) -> String {
            template.replace(AREA_PATH_TOKEN, &self.area_path)
        }
    }
}
