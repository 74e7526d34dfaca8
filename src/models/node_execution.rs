//! # Node Execution
//!
//! Snapshot of one node execution as returned by the orchestration API.
//!
//! The fields the child-group resolver depends on are `metadata.is_parent_node`,
//! `metadata.retry_group`, `metadata.spec_node_id` and
//! `closure.workflow_node_metadata`. Everything else is carried for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{NodeExecutionIdentifier, WorkflowExecutionIdentifier};
use super::phase::NodeExecutionPhase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    pub id: NodeExecutionIdentifier,
    #[serde(default)]
    pub input_uri: String,
    #[serde(default)]
    pub metadata: Option<NodeExecutionMetadata>,
    #[serde(default)]
    pub closure: NodeExecutionClosure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExecutionMetadata {
    /// Children of this node can be bulk-listed with the parent node filter
    #[serde(default)]
    pub is_parent_node: bool,
    /// Node id in the compiled workflow spec (differs from `id.node_id` for
    /// nodes created dynamically)
    #[serde(default)]
    pub spec_node_id: Option<String>,
    /// Retry attempt of the parent that produced this node
    #[serde(default)]
    pub retry_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionClosure {
    #[serde(default)]
    pub phase: NodeExecutionPhase,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workflow_node_metadata: Option<WorkflowNodeMetadata>,
    #[serde(default)]
    pub task_node_metadata: Option<TaskNodeMetadata>,
}

/// Present on nodes that launched a sub-workflow execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNodeMetadata {
    pub execution_id: WorkflowExecutionIdentifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogCacheStatus {
    #[default]
    CacheDisabled,
    CacheMiss,
    CacheHit,
    CachePopulated,
    CacheLookupFailure,
    CachePutFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNodeMetadata {
    #[serde(default)]
    pub cache_status: CatalogCacheStatus,
}

impl NodeExecution {
    pub fn new(id: NodeExecutionIdentifier, phase: NodeExecutionPhase) -> Self {
        Self {
            id,
            input_uri: String::new(),
            metadata: None,
            closure: NodeExecutionClosure {
                phase,
                ..Default::default()
            },
        }
    }

    pub fn phase(&self) -> NodeExecutionPhase {
        self.closure.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.closure.phase.is_terminal()
    }

    pub fn is_parent_node(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.is_parent_node)
    }

    pub fn spec_node_id(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.spec_node_id.as_deref())
    }

    pub fn retry_group(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.retry_group.as_deref())
    }

    /// Execution launched by this node, when it is a sub-workflow node
    pub fn sub_workflow_execution_id(&self) -> Option<&WorkflowExecutionIdentifier> {
        self.closure
            .workflow_node_metadata
            .as_ref()
            .map(|m| &m.execution_id)
    }

    pub fn with_metadata(mut self, metadata: NodeExecutionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_workflow_node_metadata(mut self, execution_id: WorkflowExecutionIdentifier) -> Self {
        self.closure.workflow_node_metadata = Some(WorkflowNodeMetadata { execution_id });
        self
    }
}
