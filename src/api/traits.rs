//! Contract between the console data layer and the orchestration API.

use async_trait::async_trait;

use crate::error::ConsoleResult;
use crate::models::{
    NodeExecution, NodeExecutionIdentifier, PaginatedEntities, RequestConfig, TaskExecution,
    TaskExecutionIdentifier, WorkflowExecutionIdentifier,
};

/// Read access to node and task executions.
///
/// Implementations forward `config` to the backend as-is. The resolver relies
/// on `list_node_executions` honoring the `parent_node_id` parameter.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// Backend name for debugging/logging.
    fn backend_name(&self) -> &'static str;

    /// List node executions of a workflow execution.
    async fn list_node_executions(
        &self,
        execution_id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<PaginatedEntities<NodeExecution>>;

    /// List the task executions (retry attempts) of a node execution.
    async fn list_task_executions(
        &self,
        node_execution_id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<Vec<TaskExecution>>;

    /// List node executions spawned by one task execution.
    async fn list_task_execution_children(
        &self,
        task_execution_id: &TaskExecutionIdentifier,
        config: &RequestConfig,
    ) -> ConsoleResult<PaginatedEntities<NodeExecution>>;

    /// Get a single node execution.
    async fn get_node_execution(&self, id: &NodeExecutionIdentifier) -> ConsoleResult<NodeExecution>;
}
