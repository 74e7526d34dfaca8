//! # Execution Identifiers
//!
//! Composite identifiers for workflow, node and task executions. Identifiers are
//! compared structurally: two identifiers with equal fields name the same entity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one run of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowExecutionIdentifier {
    pub project: String,
    pub domain: String,
    pub name: String,
}

impl WorkflowExecutionIdentifier {
    pub fn new(
        project: impl Into<String>,
        domain: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            domain: domain.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkflowExecutionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.domain, self.name)
    }
}

/// Identifies one execution of a node within a workflow execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeExecutionIdentifier {
    pub node_id: String,
    pub execution_id: WorkflowExecutionIdentifier,
}

impl NodeExecutionIdentifier {
    pub fn new(execution_id: WorkflowExecutionIdentifier, node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            execution_id,
        }
    }
}

impl fmt::Display for NodeExecutionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.execution_id, self.node_id)
    }
}

/// Identifies a registered task version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskIdentifier {
    pub project: String,
    pub domain: String,
    pub name: String,
    pub version: String,
}

impl TaskIdentifier {
    pub fn new(
        project: impl Into<String>,
        domain: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            domain: domain.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for TaskIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.project, self.domain, self.name, self.version
        )
    }
}

/// Identifies one attempt of a task run by a node execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskExecutionIdentifier {
    pub task_id: TaskIdentifier,
    pub node_execution_id: NodeExecutionIdentifier,
    /// Zero-based attempt number
    pub retry_attempt: u32,
}

impl TaskExecutionIdentifier {
    pub fn new(
        task_id: TaskIdentifier,
        node_execution_id: NodeExecutionIdentifier,
        retry_attempt: u32,
    ) -> Self {
        Self {
            task_id,
            node_execution_id,
            retry_attempt,
        }
    }
}

impl fmt::Display for TaskExecutionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} ({})",
            self.node_execution_id, self.retry_attempt, self.task_id
        )
    }
}
