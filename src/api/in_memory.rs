//! Fixture-backed [`ExecutionApi`] that records every call.
//!
//! Used by the integration tests and by the CLI's `--fixtures` mode. Responses
//! come from fixture tables keyed by identifier; failures and latency can be
//! injected per endpoint.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::traits::ExecutionApi;
use crate::constants::node_execution_query_params::PARENT_NODE_ID;
use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{
    NodeExecution, NodeExecutionIdentifier, PaginatedEntities, RequestConfig, TaskExecution,
    TaskExecutionIdentifier, WorkflowExecutionIdentifier,
};

/// Endpoints of the execution API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEndpoint {
    ListNodeExecutions,
    ListTaskExecutions,
    ListTaskExecutionChildren,
    GetNodeExecution,
}

/// One recorded request
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListNodeExecutions {
        execution_id: WorkflowExecutionIdentifier,
        config: RequestConfig,
    },
    ListTaskExecutions {
        node_execution_id: NodeExecutionIdentifier,
        config: RequestConfig,
    },
    ListTaskExecutionChildren {
        task_execution_id: TaskExecutionIdentifier,
        config: RequestConfig,
    },
    GetNodeExecution {
        id: NodeExecutionIdentifier,
    },
}

impl ApiCall {
    pub fn endpoint(&self) -> ApiEndpoint {
        match self {
            Self::ListNodeExecutions { .. } => ApiEndpoint::ListNodeExecutions,
            Self::ListTaskExecutions { .. } => ApiEndpoint::ListTaskExecutions,
            Self::ListTaskExecutionChildren { .. } => ApiEndpoint::ListTaskExecutionChildren,
            Self::GetNodeExecution { .. } => ApiEndpoint::GetNodeExecution,
        }
    }

    /// Request config the call was made with, if the endpoint takes one
    pub fn config(&self) -> Option<&RequestConfig> {
        match self {
            Self::ListNodeExecutions { config, .. }
            | Self::ListTaskExecutions { config, .. }
            | Self::ListTaskExecutionChildren { config, .. } => Some(config),
            Self::GetNodeExecution { .. } => None,
        }
    }
}

/// Serializable fixture set, loadable from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFixtures {
    #[serde(default)]
    pub workflow_executions: Vec<WorkflowExecutionFixture>,
    #[serde(default)]
    pub parent_nodes: Vec<ParentNodeFixture>,
    #[serde(default)]
    pub node_task_executions: Vec<TaskExecutionsFixture>,
    #[serde(default)]
    pub task_execution_children: Vec<TaskExecutionChildrenFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecutionFixture {
    pub id: WorkflowExecutionIdentifier,
    pub node_executions: Vec<NodeExecution>,
}

/// Children listed under `parent_node_id` for a parent node execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentNodeFixture {
    pub id: NodeExecutionIdentifier,
    pub children: Vec<NodeExecution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionsFixture {
    pub node_execution_id: NodeExecutionIdentifier,
    pub task_executions: Vec<TaskExecution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionChildrenFixture {
    pub task_execution_id: TaskExecutionIdentifier,
    pub children: Vec<NodeExecution>,
}

impl ExecutionFixtures {
    pub fn from_json_file(path: impl AsRef<Path>) -> ConsoleResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConsoleError::configuration(format!(
                "Failed to read fixtures {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Default)]
struct FixtureState {
    node_executions: HashMap<WorkflowExecutionIdentifier, Vec<NodeExecution>>,
    parent_children: HashMap<NodeExecutionIdentifier, Vec<NodeExecution>>,
    task_executions: HashMap<NodeExecutionIdentifier, Vec<TaskExecution>>,
    task_children: HashMap<TaskExecutionIdentifier, Vec<NodeExecution>>,
    failures: HashMap<ApiEndpoint, ConsoleError>,
    calls: Vec<ApiCall>,
}

/// In-memory execution API
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutionApi {
    state: Arc<Mutex<FixtureState>>,
    latency: Option<Duration>,
}

impl InMemoryExecutionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: ExecutionFixtures) -> Self {
        let api = Self::new();
        for workflow in fixtures.workflow_executions {
            api.add_node_executions(workflow.id, workflow.node_executions);
        }
        for parent in fixtures.parent_nodes {
            api.add_parent_node_children(parent.id, parent.children);
        }
        for tasks in fixtures.node_task_executions {
            api.add_task_executions(tasks.node_execution_id, tasks.task_executions);
        }
        for children in fixtures.task_execution_children {
            api.add_task_execution_children(children.task_execution_id, children.children);
        }
        api
    }

    /// Delay every response, simulating network round-trips
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn add_node_executions(
        &self,
        execution_id: WorkflowExecutionIdentifier,
        node_executions: Vec<NodeExecution>,
    ) {
        self.state
            .lock()
            .node_executions
            .entry(execution_id)
            .or_default()
            .extend(node_executions);
    }

    pub fn add_parent_node_children(
        &self,
        parent_id: NodeExecutionIdentifier,
        children: Vec<NodeExecution>,
    ) {
        self.state
            .lock()
            .parent_children
            .entry(parent_id)
            .or_default()
            .extend(children);
    }

    pub fn add_task_executions(
        &self,
        node_execution_id: NodeExecutionIdentifier,
        task_executions: Vec<TaskExecution>,
    ) {
        self.state
            .lock()
            .task_executions
            .entry(node_execution_id)
            .or_default()
            .extend(task_executions);
    }

    pub fn add_task_execution_children(
        &self,
        task_execution_id: TaskExecutionIdentifier,
        children: Vec<NodeExecution>,
    ) {
        self.state
            .lock()
            .task_children
            .entry(task_execution_id)
            .or_default()
            .extend(children);
    }

    /// Replace the node executions of a workflow execution
    pub fn replace_node_executions(
        &self,
        execution_id: WorkflowExecutionIdentifier,
        node_executions: Vec<NodeExecution>,
    ) {
        self.state
            .lock()
            .node_executions
            .insert(execution_id, node_executions);
    }

    /// Replace the children listed under a parent node
    pub fn replace_parent_node_children(
        &self,
        parent_id: NodeExecutionIdentifier,
        children: Vec<NodeExecution>,
    ) {
        self.state.lock().parent_children.insert(parent_id, children);
    }

    /// Fail every request to `endpoint` with `error` until cleared
    pub fn fail_endpoint(&self, endpoint: ApiEndpoint, error: ConsoleError) {
        self.state.lock().failures.insert(endpoint, error);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: ApiEndpoint) -> Vec<ApiCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, endpoint: ApiEndpoint) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Record the call, wait out the latency, then surface any injected failure
    async fn begin(&self, call: ApiCall) -> ConsoleResult<()> {
        let endpoint = call.endpoint();
        debug!(endpoint = ?endpoint, "In-memory execution API request");
        self.state.lock().calls.push(call);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.state.lock().failures.get(&endpoint) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn apply_limit<T>(mut entities: Vec<T>, config: &RequestConfig) -> Vec<T> {
    if let Some(limit) = config.limit {
        entities.truncate(limit as usize);
    }
    entities
}

#[async_trait]
impl ExecutionApi for InMemoryExecutionApi {
    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    async fn list_node_executions(
        &self,
        execution_id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<PaginatedEntities<NodeExecution>> {
        self.begin(ApiCall::ListNodeExecutions {
            execution_id: execution_id.clone(),
            config: config.clone(),
        })
        .await?;

        let state = self.state.lock();
        let entities = match config.param(PARENT_NODE_ID) {
            Some(parent_node_id) => {
                let parent = NodeExecutionIdentifier::new(execution_id.clone(), parent_node_id);
                state.parent_children.get(&parent).cloned().unwrap_or_default()
            }
            None => state
                .node_executions
                .get(execution_id)
                .cloned()
                .ok_or_else(|| {
                    ConsoleError::not_found("WorkflowExecution", execution_id.to_string())
                })?,
        };
        Ok(PaginatedEntities::new(apply_limit(entities, config)))
    }

    async fn list_task_executions(
        &self,
        node_execution_id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<TaskExecution>> {
        self.begin(ApiCall::ListTaskExecutions {
            node_execution_id: node_execution_id.clone(),
            config: config.clone(),
        })
        .await?;

        let state = self.state.lock();
        let task_executions = state
            .task_executions
            .get(node_execution_id)
            .cloned()
            .unwrap_or_default();
        Ok(apply_limit(task_executions, config))
    }

    async fn list_task_execution_children(
        &self,
        task_execution_id: &TaskExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<PaginatedEntities<NodeExecution>> {
        self.begin(ApiCall::ListTaskExecutionChildren {
            task_execution_id: task_execution_id.clone(),
            config: config.clone(),
        })
        .await?;

        let state = self.state.lock();
        let children = state
            .task_children
            .get(task_execution_id)
            .cloned()
            .unwrap_or_default();
        Ok(PaginatedEntities::new(apply_limit(children, config)))
    }

    async fn get_node_execution(&self, id: &NodeExecutionIdentifier) -> ConsoleResult<NodeExecution> {
        self.begin(ApiCall::GetNodeExecution { id: id.clone() }).await?;

        let state = self.state.lock();
        state
            .node_executions
            .values()
            .chain(state.parent_children.values())
            .chain(state.task_children.values())
            .flatten()
            .find(|node_execution| &node_execution.id == id)
            .cloned()
            .ok_or_else(|| ConsoleError::not_found("NodeExecution", id.to_string()))
    }
}
