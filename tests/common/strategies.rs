//! proptest strategies for node execution collections.

use proptest::prelude::*;

use execution_console::constants::{END_NODE_ID, START_NODE_ID};
use execution_console::models::{NodeExecution, NodeExecutionPhase};

use super::builders::NodeExecutionBuilder;

pub fn phase_strategy() -> impl Strategy<Value = NodeExecutionPhase> {
    prop_oneof![
        Just(NodeExecutionPhase::Queued),
        Just(NodeExecutionPhase::Running),
        Just(NodeExecutionPhase::Succeeded),
        Just(NodeExecutionPhase::Failed),
        Just(NodeExecutionPhase::Aborted),
        Just(NodeExecutionPhase::Skipped),
    ]
}

/// Node id: mostly ordinary, sometimes a reserved system id
pub fn node_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => "n[0-9]{1,2}",
        1 => Just(START_NODE_ID.to_string()),
        1 => Just(END_NODE_ID.to_string()),
    ]
}

pub fn retry_group_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        1 => Just(None),
        4 => (0u32..4).prop_map(|attempt| Some(attempt.to_string())),
    ]
}

pub fn child_strategy() -> impl Strategy<Value = NodeExecution> {
    (node_id_strategy(), retry_group_strategy(), phase_strategy()).prop_map(
        |(id, retry_group, phase)| {
            let builder = NodeExecutionBuilder::new("parent-exec", &id).phase(phase);
            match retry_group {
                Some(group) => builder.retry_group(&group).build(),
                None => builder.build(),
            }
        },
    )
}

pub fn children_strategy() -> impl Strategy<Value = Vec<NodeExecution>> {
    prop::collection::vec(child_strategy(), 0..12)
}
