//! Removal of engine-injected control nodes from fetched node execution lists.

use crate::constants::SYSTEM_NODE_IDS;
use crate::models::NodeExecution;

/// True when the node execution is one of the reserved start/end control nodes,
/// matched on either its node id or its spec node id
pub fn is_system_node(node_execution: &NodeExecution) -> bool {
    if SYSTEM_NODE_IDS.contains(&node_execution.id.node_id.as_str()) {
        return true;
    }
    node_execution
        .spec_node_id()
        .is_some_and(|spec_id| SYSTEM_NODE_IDS.contains(&spec_id))
}

/// Drop system nodes, preserving the relative order of everything else
pub fn filter_system_nodes(node_executions: Vec<NodeExecution>) -> Vec<NodeExecution> {
    node_executions
        .into_iter()
        .filter(|ne| !is_system_node(ne))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{END_NODE_ID, START_NODE_ID};
    use crate::models::{
        NodeExecutionIdentifier, NodeExecutionMetadata, NodeExecutionPhase,
        WorkflowExecutionIdentifier,
    };
    use proptest::prelude::*;

    fn node(node_id: &str) -> NodeExecution {
        NodeExecution::new(
            NodeExecutionIdentifier::new(WorkflowExecutionIdentifier::new("p", "d", "e"), node_id),
            NodeExecutionPhase::Succeeded,
        )
    }

    fn node_with_spec_id(node_id: &str, spec_node_id: &str) -> NodeExecution {
        node(node_id).with_metadata(NodeExecutionMetadata {
            spec_node_id: Some(spec_node_id.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_removes_start_and_end_nodes() {
        let filtered = filter_system_nodes(vec![
            node(START_NODE_ID),
            node("n0"),
            node(END_NODE_ID),
            node("n1"),
        ]);
        let ids: Vec<_> = filtered.iter().map(|ne| ne.id.node_id.as_str()).collect();
        assert_eq!(ids, vec!["n0", "n1"]);
    }

    #[test]
    fn test_removes_nodes_by_spec_node_id() {
        let filtered = filter_system_nodes(vec![
            node_with_spec_id("dn0-start", START_NODE_ID),
            node_with_spec_id("dn0-n1", "n1"),
        ]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.node_id, "dn0-n1");
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_system_nodes(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(ids in prop::collection::vec(
            prop_oneof![
                Just(START_NODE_ID.to_string()),
                Just(END_NODE_ID.to_string()),
                "[a-z][a-z0-9-]{0,8}",
            ],
            0..16,
        )) {
            let nodes: Vec<_> = ids.iter().map(|id| node(id)).collect();
            let once = filter_system_nodes(nodes);
            let twice = filter_system_nodes(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_filter_preserves_relative_order(ids in prop::collection::vec("[a-z]{1,6}", 0..16)) {
            let nodes: Vec<_> = ids.iter().map(|id| node(id)).collect();
            let filtered = filter_system_nodes(nodes.clone());
            prop_assert_eq!(filtered, nodes);
        }
    }
}
