//! # Child-Group Resolver
//!
//! Resolves the children of a node execution into ordered, named groups. The
//! fetch strategy comes from [`ChildFetchStrategy::classify`]; each strategy is
//! one function below. Every underlying fetch goes through the [`QueryClient`],
//! so concurrent resolutions share their API calls.
//!
//! The caller's [`RequestConfig`] is forwarded to every fetch unchanged, except
//! that the parent-node strategy adds the `parent_node_id` parameter.
//!
//! A resolution runs in a [`FetchMode`]. `Cached` lets the list caches answer
//! within their TTL; `Fresh` sends every list request to the API, which is what
//! a refetch of the child groups needs.

use futures::future::try_join_all;
use std::collections::HashMap;

use super::groups::{format_retry_attempt, NodeExecutionGroup, RetryAttemptLabels};
use super::strategy::ChildFetchStrategy;
use crate::cache::FetchMode;
use crate::config::ResolverConfig;
use crate::constants::node_execution_query_params::PARENT_NODE_ID;
use crate::error::{ConsoleError, ConsoleResult};
use crate::logging::{log_error, log_resolver_operation};
use crate::models::{NodeExecution, RequestConfig};
use crate::queries::QueryClient;

#[derive(Debug, Clone)]
pub struct ChildGroupResolver {
    client: QueryClient,
    labels: RetryAttemptLabels,
}

impl ChildGroupResolver {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            labels: RetryAttemptLabels::default(),
        }
    }

    pub fn with_config(client: QueryClient, config: &ResolverConfig) -> Self {
        Self {
            client,
            labels: RetryAttemptLabels::new(config.default_retry_group_label.clone()),
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn labels(&self) -> &RetryAttemptLabels {
        &self.labels
    }

    /// Resolve the child groups of `node_execution` with the strategy its shape selects.
    ///
    /// Empty groups are never returned. Fetch failures propagate unchanged.
    pub async fn resolve_child_groups(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let strategy = ChildFetchStrategy::classify(node_execution);
        self.resolve_with_mode(node_execution, config, strategy, FetchMode::Cached)
            .await
    }

    /// Like [`resolve_child_groups`](Self::resolve_child_groups) but bypasses
    /// fresh entries in the list caches
    pub async fn resolve_child_groups_fresh(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let strategy = ChildFetchStrategy::classify(node_execution);
        self.resolve_with_mode(node_execution, config, strategy, FetchMode::Fresh)
            .await
    }

    /// Resolve with an explicit strategy.
    ///
    /// Forcing [`ChildFetchStrategy::SubWorkflow`] on a node execution without
    /// workflow node metadata fails with [`ConsoleError::InvariantViolation`].
    pub async fn resolve_with_strategy(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
        strategy: ChildFetchStrategy,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        self.resolve_with_mode(node_execution, config, strategy, FetchMode::Cached)
            .await
    }

    pub async fn resolve_with_mode(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
        strategy: ChildFetchStrategy,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let node_execution_id = node_execution.id.to_string();
        log_resolver_operation("resolve", &node_execution_id, strategy.as_str(), "started", None);

        let result = match strategy {
            ChildFetchStrategy::ParentNode => {
                self.resolve_parent_node(node_execution, config, mode).await
            }
            ChildFetchStrategy::SubWorkflow => {
                self.resolve_sub_workflow(node_execution, config, mode).await
            }
            ChildFetchStrategy::TaskRetries => {
                self.resolve_task_retries(node_execution, config, mode).await
            }
        };

        match &result {
            Ok(groups) => log_resolver_operation(
                "resolve",
                &node_execution_id,
                strategy.as_str(),
                "resolved",
                Some(groups.len()),
            ),
            Err(e) => log_error(
                "child_group_resolver",
                strategy.as_str(),
                &e.to_string(),
                Some(&node_execution_id),
            ),
        }
        result
    }

    /// Cached resolution: concurrent callers for the same node execution and
    /// config share one resolution, and a fresh cached result is reused
    pub async fn fetch_child_groups(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let key = QueryClient::child_groups_key(&node_execution.id, config)?;
        let resolver = self.clone();
        let (node_execution, config) = (node_execution.clone(), config.clone());
        self.client
            .child_groups()
            .fetch(key, move || async move {
                resolver.resolve_child_groups(&node_execution, &config).await
            })
            .await
    }

    /// Like [`fetch_child_groups`](Self::fetch_child_groups) but never serves a cached
    /// result, from the child-group cache or from the list caches underneath
    pub async fn refetch_child_groups(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let key = QueryClient::child_groups_key(&node_execution.id, config)?;
        let resolver = self.clone();
        let (node_execution, config) = (node_execution.clone(), config.clone());
        self.client
            .child_groups()
            .refetch(key, move || async move {
                resolver.resolve_child_groups_fresh(&node_execution, &config).await
            })
            .await
    }

    async fn resolve_parent_node(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let child_config = config.with_param(PARENT_NODE_ID, node_execution.id.node_id.as_str());
        let children = self
            .client
            .fetch_node_execution_list_with_mode(&node_execution.id.execution_id, &child_config, mode)
            .await?;
        Ok(self.group_by_retry_group(children))
    }

    /// Group by retry-group label, in the order each label is first seen
    fn group_by_retry_group(&self, children: Vec<NodeExecution>) -> Vec<NodeExecutionGroup> {
        let mut groups: Vec<NodeExecutionGroup> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for child in children {
            let label = self.labels.label(child.retry_group());
            match positions.get(&label) {
                Some(&position) => groups[position].node_executions.push(child),
                None => {
                    positions.insert(label.clone(), groups.len());
                    groups.push(NodeExecutionGroup::new(label, vec![child]));
                }
            }
        }
        groups
    }

    async fn resolve_sub_workflow(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let execution_id = node_execution.sub_workflow_execution_id().ok_or_else(|| {
            ConsoleError::invariant_violation(format!(
                "node execution {} has no workflow node metadata",
                node_execution.id
            ))
        })?;

        let node_executions = self
            .client
            .fetch_node_execution_list_with_mode(execution_id, config, mode)
            .await?;
        if node_executions.is_empty() {
            return Ok(Vec::new());
        }

        // Workflow executions are not retryable: exactly one group
        Ok(vec![NodeExecutionGroup::new(
            execution_id.name.clone(),
            node_executions,
        )])
    }

    async fn resolve_task_retries(
        &self,
        node_execution: &NodeExecution,
        config: &RequestConfig,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<NodeExecutionGroup>> {
        let mut task_executions = self
            .client
            .fetch_task_execution_list_with_mode(&node_execution.id, config, mode)
            .await?;
        task_executions.sort_by_key(|task_execution| task_execution.retry_attempt());

        let group_fetches: Vec<_> = task_executions
            .iter()
            .filter(|task_execution| task_execution.is_parent)
            .map(|task_execution| async move {
                let children = self
                    .client
                    .fetch_task_execution_child_list_with_mode(&task_execution.id, config, mode)
                    .await?;
                Ok::<_, ConsoleError>(NodeExecutionGroup::new(
                    format_retry_attempt(task_execution.retry_attempt()),
                    children,
                ))
            })
            .collect();

        // Joined in retry order, whichever fetch finishes first
        let groups = try_join_all(group_fetches).await?;
        Ok(groups.into_iter().filter(|group| !group.is_empty()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryExecutionApi;
    use crate::config::QueryCacheConfig;
    use crate::error::ErrorKind;
    use crate::models::{
        NodeExecutionIdentifier, NodeExecutionMetadata, NodeExecutionPhase,
        WorkflowExecutionIdentifier,
    };
    use std::sync::Arc;

    fn resolver(default_label: Option<&str>) -> ChildGroupResolver {
        let client = QueryClient::new(
            Arc::new(InMemoryExecutionApi::new()),
            &QueryCacheConfig::for_test(),
        );
        ChildGroupResolver::with_config(
            client,
            &ResolverConfig {
                default_retry_group_label: default_label.map(str::to_string),
            },
        )
    }

    fn child(node_id: &str, retry_group: Option<&str>) -> NodeExecution {
        NodeExecution::new(
            NodeExecutionIdentifier::new(WorkflowExecutionIdentifier::new("p", "d", "e"), node_id),
            NodeExecutionPhase::Succeeded,
        )
        .with_metadata(NodeExecutionMetadata {
            retry_group: retry_group.map(str::to_string),
            ..Default::default()
        })
    }

    fn names(groups: &[NodeExecutionGroup]) -> Vec<&str> {
        groups.iter().map(|group| group.name.as_str()).collect()
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let groups = resolver(None).group_by_retry_group(vec![
            child("a", Some("1")),
            child("b", Some("0")),
            child("c", Some("1")),
            child("d", Some("0")),
        ]);
        assert_eq!(names(&groups), vec!["Attempt 02", "Attempt 01"]);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].node_executions[1].id.node_id, "c");
    }

    #[test]
    fn test_missing_retry_group_uses_default_label() {
        let groups = resolver(None).group_by_retry_group(vec![child("a", None), child("b", Some("0"))]);
        assert_eq!(names(&groups), vec!["Attempt 01"]);
        assert_eq!(groups[0].len(), 2);

        let groups = resolver(Some("Initial")).group_by_retry_group(vec![
            child("a", None),
            child("b", Some("0")),
        ]);
        assert_eq!(names(&groups), vec!["Initial", "Attempt 01"]);
    }

    #[tokio::test]
    async fn test_forced_sub_workflow_without_metadata_is_invariant_violation() {
        let err = resolver(None)
            .resolve_with_strategy(
                &child("a", None),
                &RequestConfig::new(),
                ChildFetchStrategy::SubWorkflow,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }
}
