//! # Query Client
//!
//! Bundles the execution API with one typed cache per query kind. Every fetch
//! goes through [`QueryResultCache::fetch`], so equal requests issued at the
//! same time share a single API call. A `QueryClient` is a cheap handle: clones
//! share the same caches.
//!
//! The list fetches have `_with_mode` variants. [`FetchMode::Fresh`] skips the
//! TTL and always reaches the API (still joining a request already in flight).

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::ExecutionApi;
use crate::cache::{CacheStats, FetchMode, QueryKey, QueryResultCache, QueryType};
use crate::config::QueryCacheConfig;
use crate::error::ConsoleResult;
use crate::models::{
    NodeExecution, NodeExecutionIdentifier, RequestConfig, TaskExecution, TaskExecutionIdentifier,
    WorkflowExecutionIdentifier,
};
use crate::resolver::NodeExecutionGroup;
use crate::system_nodes::filter_system_nodes;

/// Re-runnable uncached request for one query
pub type QueryFetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, ConsoleResult<T>> + Send + Sync>;

fn seed_node_executions(cache: &QueryResultCache<NodeExecution>, node_executions: &[NodeExecution]) {
    for node_execution in node_executions {
        if let Ok(key) = QueryClient::node_execution_key(&node_execution.id) {
            cache.set(key, node_execution.clone());
        }
    }
}

#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn ExecutionApi>,
    node_executions: QueryResultCache<NodeExecution>,
    node_execution_lists: QueryResultCache<Vec<NodeExecution>>,
    task_execution_lists: QueryResultCache<Vec<TaskExecution>>,
    task_execution_children: QueryResultCache<Vec<NodeExecution>>,
    child_groups: QueryResultCache<Vec<NodeExecutionGroup>>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("backend", &self.api.backend_name())
            .field("node_executions", &self.node_executions)
            .field("node_execution_lists", &self.node_execution_lists)
            .field("task_execution_lists", &self.task_execution_lists)
            .field("task_execution_children", &self.task_execution_children)
            .field("child_groups", &self.child_groups)
            .finish()
    }
}

/// Entry counts per cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryClientStats {
    pub node_executions: CacheStats,
    pub node_execution_lists: CacheStats,
    pub task_execution_lists: CacheStats,
    pub task_execution_children: CacheStats,
    pub child_groups: CacheStats,
}

impl QueryClient {
    pub fn new(api: Arc<dyn ExecutionApi>, config: &QueryCacheConfig) -> Self {
        let enabled = config.is_enabled();
        Self {
            api,
            node_executions: QueryResultCache::from_config(
                QueryType::NodeExecution.as_str(),
                &config.node_executions,
                enabled,
            ),
            node_execution_lists: QueryResultCache::from_config(
                QueryType::NodeExecutionList.as_str(),
                &config.node_execution_lists,
                enabled,
            ),
            task_execution_lists: QueryResultCache::from_config(
                QueryType::TaskExecutionList.as_str(),
                &config.task_execution_lists,
                enabled,
            ),
            task_execution_children: QueryResultCache::from_config(
                QueryType::TaskExecutionChildList.as_str(),
                &config.task_execution_children,
                enabled,
            ),
            child_groups: QueryResultCache::from_config(
                QueryType::NodeExecutionChildList.as_str(),
                &config.child_groups,
                enabled,
            ),
        }
    }

    pub fn api(&self) -> &Arc<dyn ExecutionApi> {
        &self.api
    }

    /// Cache of resolved child groups, keyed by [`child_groups_key`](Self::child_groups_key)
    pub fn child_groups(&self) -> &QueryResultCache<Vec<NodeExecutionGroup>> {
        &self.child_groups
    }

    pub fn node_execution_lists(&self) -> &QueryResultCache<Vec<NodeExecution>> {
        &self.node_execution_lists
    }

    pub fn node_execution_key(id: &NodeExecutionIdentifier) -> ConsoleResult<QueryKey> {
        QueryKey::new(QueryType::NodeExecution, id)
    }

    pub fn node_execution_list_key(
        id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<QueryKey> {
        QueryKey::new(QueryType::NodeExecutionList, &(id, config))
    }

    pub fn task_execution_list_key(
        id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<QueryKey> {
        QueryKey::new(QueryType::TaskExecutionList, &(id, config))
    }

    pub fn task_execution_child_list_key(
        id: &TaskExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<QueryKey> {
        QueryKey::new(QueryType::TaskExecutionChildList, &(id, config))
    }

    pub fn child_groups_key(
        id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<QueryKey> {
        QueryKey::new(QueryType::NodeExecutionChildList, &(id, config))
    }

    pub async fn fetch_node_execution(
        &self,
        id: &NodeExecutionIdentifier,
    ) -> ConsoleResult<NodeExecution> {
        let key = Self::node_execution_key(id)?;
        let api = Arc::clone(&self.api);
        let id = id.clone();
        self.node_executions
            .fetch(key, move || async move { api.get_node_execution(&id).await })
            .await
    }

    /// Node executions of a workflow execution, system nodes removed
    pub async fn fetch_node_execution_list(
        &self,
        id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<NodeExecution>> {
        self.fetch_node_execution_list_with_mode(id, config, FetchMode::Cached)
            .await
    }

    pub async fn fetch_node_execution_list_with_mode(
        &self,
        id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<NodeExecution>> {
        let key = Self::node_execution_list_key(id, config)?;
        let fetcher = self.node_execution_list_fetcher(id, config);
        self.node_execution_lists
            .fetch_with_mode(mode, key, move || fetcher())
            .await
    }

    /// Uncached request behind [`fetch_node_execution_list`](Self::fetch_node_execution_list).
    ///
    /// Every listed node execution also seeds the single node execution cache.
    pub fn node_execution_list_fetcher(
        &self,
        id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> QueryFetcher<Vec<NodeExecution>> {
        let api = Arc::clone(&self.api);
        let seed = self.node_executions.clone();
        let (id, config) = (id.clone(), config.clone());
        Arc::new(move || {
            let (api, seed, id, config) = (Arc::clone(&api), seed.clone(), id.clone(), config.clone());
            async move {
                let page = api.list_node_executions(&id, &config).await?;
                let node_executions = filter_system_nodes(page.entities);
                seed_node_executions(&seed, &node_executions);
                Ok(node_executions)
            }
            .boxed()
        })
    }

    pub async fn fetch_task_execution_list(
        &self,
        id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<TaskExecution>> {
        self.fetch_task_execution_list_with_mode(id, config, FetchMode::Cached)
            .await
    }

    pub async fn fetch_task_execution_list_with_mode(
        &self,
        id: &NodeExecutionIdentifier,
        config: &RequestConfig,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<TaskExecution>> {
        let key = Self::task_execution_list_key(id, config)?;
        let api = Arc::clone(&self.api);
        let (id, config) = (id.clone(), config.clone());
        self.task_execution_lists
            .fetch_with_mode(mode, key, move || async move {
                api.list_task_executions(&id, &config).await
            })
            .await
    }

    /// Node executions spawned by a task execution, system nodes removed
    pub async fn fetch_task_execution_child_list(
        &self,
        id: &TaskExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<NodeExecution>> {
        self.fetch_task_execution_child_list_with_mode(id, config, FetchMode::Cached)
            .await
    }

    pub async fn fetch_task_execution_child_list_with_mode(
        &self,
        id: &TaskExecutionIdentifier,
        config: &RequestConfig,
        mode: FetchMode,
    ) -> ConsoleResult<Vec<NodeExecution>> {
        let key = Self::task_execution_child_list_key(id, config)?;
        let api = Arc::clone(&self.api);
        let seed = self.node_executions.clone();
        let (id, config) = (id.clone(), config.clone());
        self.task_execution_children
            .fetch_with_mode(mode, key, move || async move {
                let page = api.list_task_execution_children(&id, &config).await?;
                let children = filter_system_nodes(page.entities);
                seed_node_executions(&seed, &children);
                Ok(children)
            })
            .await
    }

    /// Drop cached child groups of one node execution, for every request config
    pub fn invalidate_child_groups(&self, id: &NodeExecutionIdentifier) -> usize {
        let prefix = match serde_json::to_string(id) {
            Ok(json) => format!("[{json},"),
            Err(_) => return 0,
        };
        let removed = self
            .child_groups
            .invalidate_where(|key| key.fingerprint().starts_with(&prefix));
        debug!(node_execution_id = %id, removed = removed, "Invalidated child groups");
        removed
    }

    /// Drop cached node execution lists of one workflow execution, for every request config
    pub fn invalidate_node_execution_lists(&self, id: &WorkflowExecutionIdentifier) -> usize {
        let prefix = match serde_json::to_string(id) {
            Ok(json) => format!("[{json},"),
            Err(_) => return 0,
        };
        self.node_execution_lists
            .invalidate_where(|key| key.fingerprint().starts_with(&prefix))
    }

    pub fn clear(&self) {
        self.node_executions.clear();
        self.node_execution_lists.clear();
        self.task_execution_lists.clear();
        self.task_execution_children.clear();
        self.child_groups.clear();
    }

    pub fn stats(&self) -> QueryClientStats {
        QueryClientStats {
            node_executions: self.node_executions.stats(),
            node_execution_lists: self.node_execution_lists.stats(),
            task_execution_lists: self.task_execution_lists.stats(),
            task_execution_children: self.task_execution_children.stats(),
            child_groups: self.child_groups.stats(),
        }
    }

    /// Client whose caches keep every result for `ttl`
    pub fn with_uniform_ttl(api: Arc<dyn ExecutionApi>, ttl: Duration) -> Self {
        let mut config = QueryCacheConfig::for_test();
        for cache in [
            &mut config.node_executions,
            &mut config.node_execution_lists,
            &mut config.task_execution_lists,
            &mut config.task_execution_children,
            &mut config.child_groups,
        ] {
            cache.ttl_seconds = ttl.as_secs();
        }
        Self::new(api, &config)
    }
}
