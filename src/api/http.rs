//! # HTTP Execution API Client
//!
//! reqwest client for the orchestration REST API. Requests failing with a
//! network error or a 5xx response are retried with exponential backoff up to
//! `max_retries` attempts; 4xx responses fail immediately and 404 maps to
//! [`ConsoleError::NotFound`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::traits::ExecutionApi;
use crate::config::ApiClientConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{
    NodeExecution, NodeExecutionIdentifier, PaginatedEntities, RequestConfig, SortDirection,
    TaskExecution, TaskExecutionIdentifier, WorkflowExecutionIdentifier,
};

const API_PREFIX: [&str; 2] = ["api", "v1"];
const MAX_BACKOFF_SHIFT: u32 = 5;

#[derive(Debug, Deserialize)]
struct NodeExecutionListResponse {
    #[serde(default)]
    node_executions: Vec<NodeExecution>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskExecutionListResponse {
    #[serde(default)]
    task_executions: Vec<TaskExecution>,
}

fn non_empty_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// HTTP implementation of [`ExecutionApi`]
#[derive(Clone)]
pub struct HttpExecutionApi {
    client: Client,
    config: ApiClientConfig,
    base_url: Url,
}

impl std::fmt::Debug for HttpExecutionApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutionApi")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("max_retries", &self.config.max_retries)
            .field("auth_enabled", &self.config.auth_token.is_some())
            .finish()
    }
}

impl HttpExecutionApi {
    pub fn new(config: ApiClientConfig) -> ConsoleResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut client_builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("execution-console/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let mut default_headers = HeaderMap::new();
            default_headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))?,
            );
            client_builder = client_builder.default_headers(default_headers);
            debug!("Configured Bearer token authentication");
        }

        let client = client_builder.build().map_err(|e| {
            ConsoleError::configuration(format!("Failed to create HTTP client: {e}"))
        })?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            auth_enabled = config.auth_token.is_some(),
            "Created execution API client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build the request URL for `segments` below `/api/v1`, honoring the
    /// per-request host override and rendering the request config as a query string
    pub fn request_url(&self, segments: &[&str], config: &RequestConfig) -> ConsoleResult<Url> {
        let mut url = match config.host.as_deref() {
            Some(host) => parse_base_url(host)?,
            None => self.base_url.clone(),
        };

        url.path_segments_mut()
            .map_err(|_| {
                ConsoleError::configuration(format!("Base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);

        apply_request_config(&mut url, config);
        Ok(url)
    }

    async fn get_json<T>(&self, url: Url, resource: &str, id: &str) -> ConsoleResult<T>
    where
        T: DeserializeOwned,
    {
        debug!(url = %url, resource = resource, "Requesting execution API");

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let failure = match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<T>().await.map_err(|e| {
                            error!(error = %e, resource = resource, "Failed to parse response");
                            ConsoleError::Serialization(format!(
                                "Failed to parse {resource} response: {e}"
                            ))
                        });
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(ConsoleError::not_found(resource, id));
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    // Don't retry client errors (4xx)
                    if status.is_client_error() {
                        error!(status = %status, error = %error_text, resource = resource, "Client error from execution API");
                        return Err(ConsoleError::api_status(status.as_u16(), error_text));
                    }

                    warn!(
                        status = %status,
                        error = %error_text,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        "Server error from execution API"
                    );
                    ConsoleError::api_status(status.as_u16(), error_text)
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        "Network error calling execution API"
                    );
                    ConsoleError::from(e)
                }
            };

            if attempt >= self.config.max_retries {
                error!(
                    attempts = attempt,
                    resource = resource,
                    "Exhausted all retries for execution API request"
                );
                return Err(failure);
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(MAX_BACKOFF_SHIFT));
            tokio::time::sleep(delay).await;
        }
    }
}

fn parse_base_url(raw: &str) -> ConsoleResult<Url> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    Url::parse(&candidate)
        .map_err(|e| ConsoleError::configuration(format!("Invalid base URL '{raw}': {e}")))
}

fn sort_direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ASCENDING",
        SortDirection::Descending => "DESCENDING",
    }
}

/// Render filters, pagination, sort and extra params as query pairs
fn apply_request_config(url: &mut Url, config: &RequestConfig) {
    let has_query = config.filter_string().is_some()
        || config.limit.is_some()
        || config.token.is_some()
        || config.sort.is_some()
        || !config.params.is_empty();
    if !has_query {
        return;
    }

    let mut query_pairs = url.query_pairs_mut();
    if let Some(filters) = config.filter_string() {
        query_pairs.append_pair("filters", &filters);
    }
    if let Some(limit) = config.limit {
        query_pairs.append_pair("limit", &limit.to_string());
    }
    if let Some(token) = &config.token {
        query_pairs.append_pair("token", token);
    }
    if let Some(sort) = &config.sort {
        query_pairs.append_pair("sort_by.key", &sort.key);
        query_pairs.append_pair("sort_by.direction", sort_direction(sort.direction));
    }
    for (key, value) in &config.params {
        query_pairs.append_pair(key, value);
    }
}

fn execution_segments(id: &WorkflowExecutionIdentifier) -> [&str; 3] {
    [id.project.as_str(), id.domain.as_str(), id.name.as_str()]
}

#[async_trait]
impl ExecutionApi for HttpExecutionApi {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn list_node_executions(
        &self,
        execution_id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<PaginatedEntities<NodeExecution>> {
        let mut segments = vec!["node_executions"];
        segments.extend(execution_segments(execution_id));
        let url = self.request_url(&segments, config)?;

        let response: NodeExecutionListResponse = self
            .get_json(url, "WorkflowExecution", &execution_id.to_string())
            .await?;
        Ok(PaginatedEntities {
            entities: response.node_executions,
            token: non_empty_token(response.token),
        })
    }

    async fn list_task_executions(
        &self,
        node_execution_id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<TaskExecution>> {
        let mut segments = vec!["task_executions"];
        segments.extend(execution_segments(&node_execution_id.execution_id));
        segments.push(node_execution_id.node_id.as_str());
        let url = self.request_url(&segments, config)?;

        let response: TaskExecutionListResponse = self
            .get_json(url, "NodeExecution", &node_execution_id.to_string())
            .await?;
        Ok(response.task_executions)
    }

    async fn list_task_execution_children(
        &self,
        task_execution_id: &TaskExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<PaginatedEntities<NodeExecution>> {
        let node_execution_id = &task_execution_id.node_execution_id;
        let task_id = &task_execution_id.task_id;
        let retry_attempt = task_execution_id.retry_attempt.to_string();

        let mut segments = vec!["children", "task_executions"];
        segments.extend(execution_segments(&node_execution_id.execution_id));
        segments.push(node_execution_id.node_id.as_str());
        segments.extend([
            task_id.project.as_str(),
            task_id.domain.as_str(),
            task_id.name.as_str(),
            task_id.version.as_str(),
            retry_attempt.as_str(),
        ]);
        let url = self.request_url(&segments, config)?;

        let response: NodeExecutionListResponse = self
            .get_json(url, "TaskExecution", &task_execution_id.to_string())
            .await?;
        Ok(PaginatedEntities {
            entities: response.node_executions,
            token: non_empty_token(response.token),
        })
    }

    async fn get_node_execution(&self, id: &NodeExecutionIdentifier) -> ConsoleResult<NodeExecution> {
        let mut segments = vec!["node_executions"];
        segments.extend(execution_segments(&id.execution_id));
        segments.push(id.node_id.as_str());
        let url = self.request_url(&segments, &RequestConfig::default())?;

        self.get_json(url, "NodeExecution", &id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{FilterExpression, FilterOperation};
    use serde_json::json;

    fn client() -> HttpExecutionApi {
        HttpExecutionApi::new(ApiClientConfig::default()).unwrap()
    }

    #[test]
    fn test_client_creation_rejects_invalid_base_url() {
        let config = ApiClientConfig {
            base_url: "http://".to_string(),
            ..Default::default()
        };
        let err = HttpExecutionApi::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_client_creation_with_auth_token() {
        let config = ApiClientConfig {
            auth_token: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(HttpExecutionApi::new(config).is_ok());
    }

    #[test]
    fn test_request_url_without_config() {
        let url = client()
            .request_url(&["node_executions", "p", "d", "e"], &RequestConfig::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8088/api/v1/node_executions/p/d/e");
    }

    #[test]
    fn test_request_url_renders_filters_and_params() {
        let config = RequestConfig::new()
            .with_filter(FilterExpression::new("phase", FilterOperation::Eq, "FAILED"))
            .with_filter(FilterExpression::value_in("node_id", ["a", "b"]))
            .with_limit(50)
            .with_sort("created_at", SortDirection::Descending)
            .with_param("parent_node_id", "n1");

        let url = client().request_url(&["node_executions", "p", "d", "e"], &config).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("filters".to_string(), "eq(phase,FAILED)+value_in(node_id,a;b)".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("sort_by.key".to_string(), "created_at".to_string()),
                ("sort_by.direction".to_string(), "DESCENDING".to_string()),
                ("parent_node_id".to_string(), "n1".to_string()),
            ]
        );
    }

    #[test]
    fn test_host_override_replaces_base_url() {
        let config = RequestConfig::new().with_host("admin.example.com");
        let url = client().request_url(&["node_executions", "p", "d", "e"], &config).unwrap();
        assert_eq!(url.as_str(), "https://admin.example.com/api/v1/node_executions/p/d/e");
    }

    #[test]
    fn test_base_url_path_prefix_is_kept_and_segments_escaped() {
        let api = HttpExecutionApi::new(ApiClientConfig {
            base_url: "http://gateway.local/console/".to_string(),
            ..Default::default()
        })
        .unwrap();
        let url = api
            .request_url(&["node_executions", "p", "d", "node/with slash"], &RequestConfig::new())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://gateway.local/console/api/v1/node_executions/p/d/node%2Fwith%20slash"
        );
    }

    #[test]
    fn test_node_execution_list_response_deserialization() {
        let body = json!({
            "node_executions": [{
                "id": {
                    "node_id": "n0",
                    "execution_id": {"project": "p", "domain": "d", "name": "e"}
                },
                "metadata": {"is_parent_node": true, "retry_group": "1"},
                "closure": {"phase": "RUNNING"}
            }],
            "token": ""
        });

        let response: NodeExecutionListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.node_executions.len(), 1);
        assert!(response.node_executions[0].is_parent_node());
        assert_eq!(response.node_executions[0].retry_group(), Some("1"));
        assert_eq!(non_empty_token(response.token), None);
    }

    #[test]
    fn test_task_execution_list_response_deserialization() {
        let body = json!({
            "task_executions": [{
                "id": {
                    "task_id": {"project": "p", "domain": "d", "name": "t", "version": "v1"},
                    "node_execution_id": {
                        "node_id": "n0",
                        "execution_id": {"project": "p", "domain": "d", "name": "e"}
                    },
                    "retry_attempt": 1
                },
                "is_parent": true,
                "closure": {"phase": "SUCCEEDED"}
            }]
        });

        let response: TaskExecutionListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.task_executions[0].retry_attempt(), 1);
        assert!(response.task_executions[0].is_parent);
        assert!(response.task_executions[0].is_terminal());
    }
}
