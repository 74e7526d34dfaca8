//! Builders for node and task execution snapshots.

use execution_console::models::{
    NodeExecution, NodeExecutionIdentifier, NodeExecutionMetadata, NodeExecutionPhase,
    TaskExecution, TaskExecutionIdentifier, TaskExecutionPhase, TaskIdentifier,
    WorkflowExecutionIdentifier,
};

pub fn execution(name: &str) -> WorkflowExecutionIdentifier {
    WorkflowExecutionIdentifier::new("flytesnacks", "development", name)
}

pub fn node_id(execution_name: &str, node_id: &str) -> NodeExecutionIdentifier {
    NodeExecutionIdentifier::new(execution(execution_name), node_id)
}

/// Fluent builder for [`NodeExecution`]
#[derive(Debug, Clone)]
pub struct NodeExecutionBuilder {
    node_execution: NodeExecution,
}

impl NodeExecutionBuilder {
    pub fn new(execution_name: &str, id: &str) -> Self {
        Self {
            node_execution: NodeExecution::new(
                node_id(execution_name, id),
                NodeExecutionPhase::Succeeded,
            ),
        }
    }

    pub fn phase(mut self, phase: NodeExecutionPhase) -> Self {
        self.node_execution.closure.phase = phase;
        self
    }

    pub fn parent_node(mut self) -> Self {
        self.metadata().is_parent_node = true;
        self
    }

    pub fn retry_group(mut self, retry_group: &str) -> Self {
        self.metadata().retry_group = Some(retry_group.to_string());
        self
    }

    pub fn spec_node_id(mut self, spec_node_id: &str) -> Self {
        self.metadata().spec_node_id = Some(spec_node_id.to_string());
        self
    }

    pub fn sub_workflow(mut self, execution_name: &str) -> Self {
        self.node_execution = self
            .node_execution
            .with_workflow_node_metadata(execution(execution_name));
        self
    }

    pub fn build(self) -> NodeExecution {
        self.node_execution
    }

    fn metadata(&mut self) -> &mut NodeExecutionMetadata {
        self.node_execution
            .metadata
            .get_or_insert_with(NodeExecutionMetadata::default)
    }
}

pub fn node(execution_name: &str, id: &str) -> NodeExecution {
    NodeExecutionBuilder::new(execution_name, id).build()
}

pub fn task_execution(
    parent: &NodeExecutionIdentifier,
    retry_attempt: u32,
    is_parent: bool,
) -> TaskExecution {
    TaskExecution::new(
        task_execution_id(parent, retry_attempt),
        TaskExecutionPhase::Succeeded,
        is_parent,
    )
}

pub fn task_execution_id(
    parent: &NodeExecutionIdentifier,
    retry_attempt: u32,
) -> TaskExecutionIdentifier {
    TaskExecutionIdentifier::new(
        TaskIdentifier::new("flytesnacks", "development", "map_task", "v1"),
        parent.clone(),
        retry_attempt,
    )
}

pub fn node_ids(node_executions: &[NodeExecution]) -> Vec<&str> {
    node_executions
        .iter()
        .map(|node_execution| node_execution.id.node_id.as_str())
        .collect()
}
