//! Classification of node executions by how their children are fetched.

use std::fmt;

use crate::models::NodeExecution;

/// How the children of a node execution are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildFetchStrategy {
    /// Bulk-list children with the parent node filter, grouped by retry group
    ParentNode,
    /// List the node executions of the launched sub-workflow execution
    SubWorkflow,
    /// List task retries, then the children of each retry flagged as a parent
    TaskRetries,
}

impl ChildFetchStrategy {
    /// Pick the strategy for `node_execution`. The first matching variant in
    /// declaration order wins.
    pub fn classify(node_execution: &NodeExecution) -> Self {
        if node_execution.is_parent_node() {
            return Self::ParentNode;
        }
        match node_execution.sub_workflow_execution_id() {
            // A sub-workflow id equal to the node's own execution is not a real nesting
            Some(execution_id) if execution_id != &node_execution.id.execution_id => {
                Self::SubWorkflow
            }
            _ => Self::TaskRetries,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentNode => "parent_node",
            Self::SubWorkflow => "sub_workflow",
            Self::TaskRetries => "task_retries",
        }
    }
}

impl fmt::Display for ChildFetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
