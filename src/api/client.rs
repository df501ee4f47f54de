use async_trait::async_trait;
use reqwest::{Client, header::HeaderMap};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{PatCredential, WorkItemQueries};
use crate::config::DevOpsConfig;
use crate::error::ApiError;
use crate::models::{AREA_PATH_TOKEN, WorkItemDetails, WorkItemRef, WorkItemViewModel};
use crate::utils::html_to_plain_text;

/// REST API version sent with every request.
pub const API_VERSION: &str = "6.0";

/// HTTP client for the WIQL and work item endpoints of one project.
#[derive(Debug, Clone)]
pub struct AzureDevOpsClient {
    client: Client,
    /// `{endpoint}/{organization}/{project}`
    project_url: String,
    area_path: String,
}

impl AzureDevOpsClient {
    /// Builds a client that authenticates every request with the configured PAT
    /// and gives up after the configured timeout.
    pub fn new(config: &DevOpsConfig) -> Result<Self, ApiError> {
        let credential = PatCredential::new(config.pat.clone());

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            credential.basic_auth_header()?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout_duration())
            .build()?;

        Ok(Self {
            client,
            project_url: format!(
                "{}/{}/{}",
                config.api_endpoint.trim_end_matches('/'),
                config.organization.value(),
                config.project.value()
            ),
            area_path: config.area_path.value().clone(),
        })
    }

    pub fn wiql_url(&self) -> String {
        format!(
            "{}/_apis/wit/wiql?api-version={}",
            self.project_url, API_VERSION
        )
    }

    pub fn work_item_url(&self, id: &str) -> String {
        format!(
            "{}/_apis/wit/workitems/{}?api-version={}",
            self.project_url, id, API_VERSION
        )
    }

    /// Sends the request and returns the JSON body, mapping non-success
    /// statuses and undecodable bodies to typed errors.
    async fn send_json(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(url, error = %e, "request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Azure DevOps returned an error status");
            return Err(ApiError::from_status(status, url));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::ParseError {
            message: format!("invalid JSON from {url}: {e}"),
        })
    }
}

/// Pulls the work item references out of a WIQL response.
///
/// Elements without an id are skipped; numeric and string ids are both accepted.
pub fn parse_wiql_response(body: &Value) -> Result<Vec<WorkItemRef>, ApiError> {
    let items = body
        .get("workItems")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::ParseError {
            message: "response has no workItems array".to_string(),
        })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = match item.get("id") {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => {
                    debug!(item = %item, "skipping work item reference without id");
                    return None;
                }
            };
            Some(WorkItemRef {
                id,
                url: item.get("url").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect())
}

/// Builds the view model from a work item response.
///
/// `requested_id` is used when the body carries no id of its own.
pub fn parse_work_item(body: Value, requested_id: &str) -> Result<WorkItemViewModel, ApiError> {
    let Value::Object(mut object) = body else {
        return Err(ApiError::ParseError {
            message: format!("work item {requested_id} is not a JSON object"),
        });
    };

    let id = match object.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => requested_id.to_string(),
    };

    let fields = match object.remove("fields") {
        Some(Value::Object(fields)) => fields,
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            return Err(ApiError::ParseError {
                message: format!("work item {id} has non-object fields: {other}"),
            });
        }
    };

    let title = fields
        .get("System.Title")
        .and_then(Value::as_str)
        .map(str::to_string);
    let description = fields
        .get("System.Description")
        .and_then(Value::as_str)
        .map(html_to_plain_text);

    Ok(WorkItemViewModel {
        id,
        title,
        fields,
        details: WorkItemDetails { description },
    })
}

#[async_trait]
impl WorkItemQueries for AzureDevOpsClient {
    async fn execute_query(&self, query: &str) -> Result<Vec<WorkItemRef>, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::InvalidQuery);
        }

        let url = self.wiql_url();
        debug!(url = %url, "executing WIQL query");

        let body = self
            .send_json(self.client.post(&url).json(&json!({ "query": query })), &url)
            .await?;
        let refs = parse_wiql_response(&body)?;

        debug!(count = refs.len(), "WIQL query returned work items");
        Ok(refs)
    }

    async fn fetch_work_item_details(&self, id: &str) -> Result<WorkItemViewModel, ApiError> {
        let url = self.work_item_url(id);
        debug!(url = %url, "fetching work item");

        let body = self.send_json(self.client.get(&url), &url).await?;
        parse_work_item(body, id)
    }

    fn replace_area_path(&self, template: &str) -> String {
        template.replace(AREA_PATH_TOKEN, &self.area_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed_property::ParsedProperty;
    use mockito::{Matcher, Server};
    use secrecy::SecretString;
    use std::path::PathBuf;

    pub(crate) fn test_config(endpoint: &str) -> DevOpsConfig {
        DevOpsConfig {
            organization: ParsedProperty::Default("org".to_string()),
            project: ParsedProperty::Default("proj".to_string()),
            pat: SecretString::from("pat".to_string()),
            pat_source: "default",
            area_path: ParsedProperty::Default("proj\\team".to_string()),
            api_endpoint: ParsedProperty::Default(endpoint.to_string()),
            timeout: ParsedProperty::Default(5),
            db_path: ParsedProperty::Default(PathBuf::from("/tmp/unused.db")),
        }
    }

    fn api_version() -> Matcher {
        Matcher::UrlEncoded("api-version".to_string(), "6.0".to_string())
    }

    /// # Endpoint URLs
    ///
    /// Tests URL construction from the configured endpoint.
    ///
    /// ## Test Scenario
    /// - Builds a client whose endpoint ends with a slash
    ///
    /// ## Expected Outcome
    /// - No double slash, api-version 6.0 on both URLs
    #[test]
    fn test_urls_trim_trailing_slash() {
        let client = AzureDevOpsClient::new(&test_config("https://dev.azure.com/")).unwrap();
        assert_eq!(
            client.wiql_url(),
            "https://dev.azure.com/org/proj/_apis/wit/wiql?api-version=6.0"
        );
        assert_eq!(
            client.work_item_url("42"),
            "https://dev.azure.com/org/proj/_apis/wit/workitems/42?api-version=6.0"
        );
    }

    /// # Area Path Substitution
    ///
    /// Tests literal replacement of the placeholder token.
    ///
    /// ## Test Scenario
    /// - Template with two tokens, template without token, empty template
    ///
    /// ## Expected Outcome
    /// - Every token replaced; other templates unchanged
    #[test]
    fn test_replace_area_path() {
        let client = AzureDevOpsClient::new(&test_config("https://dev.azure.com")).unwrap();

        assert_eq!(
            client.replace_area_path("A = '@AREAPATH@' OR B = '@AREAPATH@'"),
            "A = 'proj\\team' OR B = 'proj\\team'"
        );
        assert_eq!(
            client.replace_area_path("SELECT [System.Id] FROM WorkItems"),
            "SELECT [System.Id] FROM WorkItems"
        );
        assert_eq!(client.replace_area_path(""), "");
        assert_eq!(
            None::<&str>.map(|t| client.replace_area_path(t)),
            None
        );
    }

    /// # Execute Query Success
    ///
    /// Tests the WIQL POST: URL, auth header, body and response parsing.
    ///
    /// ## Test Scenario
    /// - Mock server expects the exact request and returns three references,
    ///   one of them without an id
    ///
    /// ## Expected Outcome
    /// - Two references in response order with numeric and string ids
    #[tokio::test]
    async fn test_execute_query_success() {
        let mut server = Server::new_async().await;
        let query = "SELECT [System.Id] FROM WorkItems";
        let mock = server
            .mock("POST", "/org/proj/_apis/wit/wiql")
            .match_query(api_version())
            .match_header("authorization", "Basic OnBhdA==")
            .match_body(Matcher::Json(json!({ "query": query })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"queryType":"flat","workItems":[
                    {"id":1,"url":"https://x/1"},
                    {"url":"https://x/none"},
                    {"id":"2"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = AzureDevOpsClient::new(&test_config(&server.url())).unwrap();
        let refs = client.execute_query(query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            refs,
            vec![
                WorkItemRef {
                    id: "1".to_string(),
                    url: Some("https://x/1".to_string())
                },
                WorkItemRef {
                    id: "2".to_string(),
                    url: None
                },
            ]
        );
    }

    /// # Execute Query Rejects Blank Text
    ///
    /// Tests that whitespace-only queries never reach the network.
    ///
    /// ## Test Scenario
    /// - Executes "   " against a server with no mocks
    ///
    /// ## Expected Outcome
    /// - InvalidQuery
    #[tokio::test]
    async fn test_execute_query_blank_is_invalid() {
        let server = Server::new_async().await;
        let client = AzureDevOpsClient::new(&test_config(&server.url())).unwrap();

        let result = client.execute_query("   ").await;
        assert!(matches!(result, Err(ApiError::InvalidQuery)));
    }

    /// # Execute Query Error Statuses
    ///
    /// Tests mapping of non-success statuses.
    ///
    /// ## Test Scenario
    /// - Server answers 401, then 404, then 500
    ///
    /// ## Expected Outcome
    /// - Unauthorized, NotFound and RequestFailed carrying status and URL
    #[tokio::test]
    async fn test_execute_query_error_statuses() {
        let mut server = Server::new_async().await;
        let client = AzureDevOpsClient::new(&test_config(&server.url())).unwrap();

        for status in [401, 404, 500] {
            let mock = server
                .mock("POST", "/org/proj/_apis/wit/wiql")
                .match_query(api_version())
                .with_status(status)
                .create_async()
                .await;

            let err = client.execute_query("SELECT 1").await.unwrap_err();
            match (status, err) {
                (401, ApiError::Unauthorized { url }) | (404, ApiError::NotFound { url }) => {
                    assert!(url.ends_with("/org/proj/_apis/wit/wiql?api-version=6.0"))
                }
                (500, ApiError::RequestFailed { status, url }) => {
                    assert_eq!(status, 500);
                    assert!(url.contains("/_apis/wit/wiql"));
                }
                (status, other) => panic!("unexpected error for {status}: {other:?}"),
            }

            mock.assert_async().await;
            mock.remove_async().await;
        }
    }

    /// # Execute Query Malformed Body
    ///
    /// Tests that bad bodies produce ParseError.
    ///
    /// ## Test Scenario
    /// - Server returns invalid JSON, then JSON without workItems
    ///
    /// ## Expected Outcome
    /// - ParseError both times
    #[tokio::test]
    async fn test_execute_query_malformed_body() {
        let mut server = Server::new_async().await;
        let client = AzureDevOpsClient::new(&test_config(&server.url())).unwrap();

        for body in ["not json", r#"{"value":[]}"#] {
            let mock = server
                .mock("POST", "/org/proj/_apis/wit/wiql")
                .match_query(api_version())
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            let result = client.execute_query("SELECT 1").await;
            assert!(matches!(result, Err(ApiError::ParseError { .. })), "body: {body}");

            mock.remove_async().await;
        }
    }

    /// # Fetch Work Item Details
    ///
    /// Tests the work item GET and conversion into a view model.
    ///
    /// ## Test Scenario
    /// - Server returns fields with a title and an HTML description
    ///
    /// ## Expected Outcome
    /// - Title, full field map and plain-text description are populated
    #[tokio::test]
    async fn test_fetch_work_item_details() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/org/proj/_apis/wit/workitems/42")
            .match_query(api_version())
            .match_header("authorization", "Basic OnBhdA==")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": 42,
                    "fields": {
                        "System.Title": "Fix login",
                        "System.State": "Committed",
                        "System.Description": "<div>Steps:</div><ul><li>Open</li><li>Sign in</li></ul>"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = AzureDevOpsClient::new(&test_config(&server.url())).unwrap();
        let item = client.fetch_work_item_details("42").await.unwrap();

        mock.assert_async().await;
        assert_eq!(item.id, "42");
        assert_eq!(item.title.as_deref(), Some("Fix login"));
        assert_eq!(item.fields.len(), 3);
        assert_eq!(item.fields["System.State"], json!("Committed"));
        assert_eq!(item.description(), Some("Steps:\n- Open\n- Sign in"));
        assert_eq!(item.list_item(), "#42: Fix login");
    }

    /// # Fetch Work Item Not Found
    ///
    /// Tests that a missing work item surfaces as NotFound.
    ///
    /// ## Test Scenario
    /// - Server answers 404 for the item
    ///
    /// ## Expected Outcome
    /// - NotFound with the item URL
    #[tokio::test]
    async fn test_fetch_work_item_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/org/proj/_apis/wit/workitems/7")
            .match_query(api_version())
            .with_status(404)
            .create_async()
            .await;

        let client = AzureDevOpsClient::new(&test_config(&server.url())).unwrap();
        match client.fetch_work_item_details("7").await {
            Err(ApiError::NotFound { url }) => assert!(url.contains("/workitems/7?")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_work_item_without_fields() {
        let item = parse_work_item(json!({ "rev": 1 }), "9").unwrap();
        assert_eq!(item.id, "9");
        assert!(item.title.is_none());
        assert!(item.fields.is_empty());
        assert!(item.description().is_none());

        assert!(matches!(
            parse_work_item(json!([1, 2]), "9"),
            Err(ApiError::ParseError { .. })
        ));
    }
}
