//! # Query Observers
//!
//! Subscription-style access to cached queries. An observer publishes a
//! [`QueryState`] through a `tokio::sync::watch` channel. Each call to
//! [`QueryObserver::refresh`] consults the refresh policy against the cached
//! value: when the policy says the value is final it is republished untouched,
//! otherwise the query is refetched (sharing any fetch already in flight).

use futures::future::FutureExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::client::{QueryClient, QueryFetcher};
use super::refresh_policy::{AlwaysRefetch, ChildGroupRefreshPolicy, RefreshPolicy};
use crate::cache::{QueryKey, QueryResultCache};
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{NodeExecution, RequestConfig, WorkflowExecutionIdentifier};
use crate::resolver::{ChildGroupResolver, NodeExecutionGroup};

/// What a subscriber sees of a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<ConsoleError>,
    pub is_loading: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.is_none() && !self.is_loading
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub struct QueryObserver<T> {
    cache: QueryResultCache<T>,
    key: QueryKey,
    fetcher: QueryFetcher<T>,
    policy: Arc<dyn RefreshPolicy<T>>,
    state: watch::Sender<QueryState<T>>,
}

impl<T> std::fmt::Debug for QueryObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver")
            .field("cache", &self.cache.name())
            .field("key", &self.key.to_string())
            .finish()
    }
}

impl<T> QueryObserver<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        cache: QueryResultCache<T>,
        key: QueryKey,
        fetcher: QueryFetcher<T>,
        policy: Arc<dyn RefreshPolicy<T>>,
    ) -> Self {
        let initial = QueryState {
            data: cache.get_data(&key),
            ..Default::default()
        };
        let (state, _) = watch::channel(initial);
        Self {
            cache,
            key,
            fetcher,
            policy,
            state,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Whether the next [`refresh`](Self::refresh) would fetch
    pub fn is_enabled(&self) -> bool {
        match self.cache.get_data(&self.key) {
            Some(cached) => self.policy.should_refetch(&cached),
            None => true,
        }
    }

    /// Point the observer at another query, keeping its subscribers
    pub fn set_query(&mut self, key: QueryKey, fetcher: QueryFetcher<T>) {
        self.key = key;
        self.fetcher = fetcher;
    }

    pub fn set_policy(&mut self, policy: Arc<dyn RefreshPolicy<T>>) {
        self.policy = policy;
    }

    /// Re-evaluate the query and publish the outcome
    pub async fn refresh(&self) -> QueryState<T> {
        let cached = self.cache.get_data(&self.key);
        let enabled = cached
            .as_ref()
            .map_or(true, |value| self.policy.should_refetch(value));

        if !enabled {
            debug!(key = %self.key, "Cached query is final, skipping refetch");
            let next = QueryState {
                data: cached,
                ..Default::default()
            };
            self.state.send_replace(next.clone());
            return next;
        }

        let previous = cached.or_else(|| self.state.borrow().data.clone());
        self.state.send_replace(QueryState {
            data: previous.clone(),
            error: None,
            is_loading: true,
        });

        let fetcher = Arc::clone(&self.fetcher);
        let next = match self.cache.refetch(self.key.clone(), move || fetcher()).await {
            Ok(data) => QueryState {
                data: Some(data),
                ..Default::default()
            },
            Err(error) => QueryState {
                data: previous,
                error: Some(error),
                is_loading: false,
            },
        };
        self.state.send_replace(next.clone());
        next
    }
}

/// Observer of the root node execution list of a workflow execution.
///
/// There is no cheap staleness signal for the root list, so every refresh refetches.
pub fn node_execution_list_observer(
    client: &QueryClient,
    id: &WorkflowExecutionIdentifier,
    config: &RequestConfig,
) -> ConsoleResult<QueryObserver<Vec<NodeExecution>>> {
    Ok(QueryObserver::new(
        client.node_execution_lists().clone(),
        QueryClient::node_execution_list_key(id, config)?,
        client.node_execution_list_fetcher(id, config),
        Arc::new(AlwaysRefetch),
    ))
}

/// Observer of the child groups of one node execution.
///
/// Cached groups are reused once the node execution and all of its known
/// children are terminal. Until then every refresh resolves against the API,
/// bypassing the list caches.
#[derive(Debug)]
pub struct ChildGroupsObserver {
    resolver: ChildGroupResolver,
    config: RequestConfig,
    node_execution: NodeExecution,
    observer: QueryObserver<Vec<NodeExecutionGroup>>,
}

impl ChildGroupsObserver {
    pub fn new(
        resolver: ChildGroupResolver,
        node_execution: NodeExecution,
        config: RequestConfig,
    ) -> ConsoleResult<Self> {
        let key = QueryClient::child_groups_key(&node_execution.id, &config)?;
        let observer = QueryObserver::new(
            resolver.client().child_groups().clone(),
            key,
            Self::fetcher(&resolver, &node_execution, &config),
            Arc::new(ChildGroupRefreshPolicy::for_parent(&node_execution)),
        );
        Ok(Self {
            resolver,
            config,
            node_execution,
            observer,
        })
    }

    fn fetcher(
        resolver: &ChildGroupResolver,
        node_execution: &NodeExecution,
        config: &RequestConfig,
    ) -> QueryFetcher<Vec<NodeExecutionGroup>> {
        let resolver = resolver.clone();
        let (node_execution, config) = (node_execution.clone(), config.clone());
        Arc::new(move || {
            let (resolver, node_execution, config) =
                (resolver.clone(), node_execution.clone(), config.clone());
            async move {
                resolver
                    .resolve_child_groups_fresh(&node_execution, &config)
                    .await
            }
            .boxed()
        })
    }

    pub fn node_execution(&self) -> &NodeExecution {
        &self.node_execution
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<Vec<NodeExecutionGroup>>> {
        self.observer.subscribe()
    }

    pub fn state(&self) -> QueryState<Vec<NodeExecutionGroup>> {
        self.observer.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_enabled()
    }

    pub async fn refresh(&self) -> QueryState<Vec<NodeExecutionGroup>> {
        self.observer.refresh().await
    }

    /// Track a new snapshot of the owning node execution.
    ///
    /// Re-evaluates the query when the identity or the terminal status changed
    /// and returns the published state; otherwise returns the current state.
    pub async fn update_node_execution(
        &mut self,
        node_execution: NodeExecution,
    ) -> ConsoleResult<QueryState<Vec<NodeExecutionGroup>>> {
        let identity_changed = node_execution.id != self.node_execution.id;
        let terminal_changed = node_execution.is_terminal() != self.node_execution.is_terminal();

        let fetcher = Self::fetcher(&self.resolver, &node_execution, &self.config);
        let key = if identity_changed {
            QueryClient::child_groups_key(&node_execution.id, &self.config)?
        } else {
            self.observer.key().clone()
        };
        self.observer.set_query(key, fetcher);
        self.observer
            .set_policy(Arc::new(ChildGroupRefreshPolicy::for_parent(&node_execution)));
        self.node_execution = node_execution;

        if identity_changed || terminal_changed {
            Ok(self.observer.refresh().await)
        } else {
            Ok(self.observer.state())
        }
    }
}
