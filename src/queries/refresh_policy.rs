//! Conditional refresh policies.
//!
//! A policy looks at the value already cached for a query and decides whether
//! a re-subscribing observer should refetch it or reuse it as-is.

use crate::models::NodeExecution;
use crate::resolver::NodeExecutionGroup;

pub trait RefreshPolicy<T>: Send + Sync {
    fn should_refetch(&self, cached: &T) -> bool;
}

impl<T, F> RefreshPolicy<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn should_refetch(&self, cached: &T) -> bool {
        self(cached)
    }
}

/// Treat every cached value as stale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysRefetch;

impl<T> RefreshPolicy<T> for AlwaysRefetch {
    fn should_refetch(&self, _cached: &T) -> bool {
        true
    }
}

/// Child groups of a node execution are final once the node execution and
/// every known child are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildGroupRefreshPolicy {
    pub parent_terminal: bool,
}

impl ChildGroupRefreshPolicy {
    pub fn for_parent(parent: &NodeExecution) -> Self {
        Self {
            parent_terminal: parent.is_terminal(),
        }
    }
}

impl RefreshPolicy<Vec<NodeExecutionGroup>> for ChildGroupRefreshPolicy {
    fn should_refetch(&self, cached: &Vec<NodeExecutionGroup>) -> bool {
        if !self.parent_terminal {
            return true;
        }
        cached
            .iter()
            .flat_map(|group| group.node_executions.iter())
            .any(|child| !child.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeExecutionIdentifier, NodeExecutionPhase, WorkflowExecutionIdentifier};

    fn node(node_id: &str, phase: NodeExecutionPhase) -> NodeExecution {
        NodeExecution::new(
            NodeExecutionIdentifier::new(WorkflowExecutionIdentifier::new("p", "d", "e"), node_id),
            phase,
        )
    }

    fn groups(phases: &[NodeExecutionPhase]) -> Vec<NodeExecutionGroup> {
        vec![NodeExecutionGroup::new(
            "Attempt 01",
            phases
                .iter()
                .enumerate()
                .map(|(i, phase)| node(&format!("n{i}"), *phase))
                .collect(),
        )]
    }

    #[test]
    fn test_running_parent_always_refetches() {
        let policy = ChildGroupRefreshPolicy::for_parent(&node("p", NodeExecutionPhase::Running));
        assert!(policy.should_refetch(&groups(&[NodeExecutionPhase::Succeeded])));
        assert!(policy.should_refetch(&Vec::new()));
    }

    #[test]
    fn test_terminal_parent_with_terminal_children_reuses_cache() {
        let policy = ChildGroupRefreshPolicy::for_parent(&node("p", NodeExecutionPhase::Failed));
        assert!(!policy.should_refetch(&groups(&[
            NodeExecutionPhase::Succeeded,
            NodeExecutionPhase::Failed
        ])));
        assert!(!policy.should_refetch(&Vec::new()));
    }

    #[test]
    fn test_terminal_parent_with_running_child_refetches() {
        let policy = ChildGroupRefreshPolicy::for_parent(&node("p", NodeExecutionPhase::Succeeded));
        assert!(policy.should_refetch(&groups(&[
            NodeExecutionPhase::Succeeded,
            NodeExecutionPhase::Running
        ])));
    }

    #[test]
    fn test_always_and_closure_policies() {
        assert!(RefreshPolicy::<u32>::should_refetch(&AlwaysRefetch, &1));
        let even = |value: &u32| value % 2 == 0;
        assert!(even.should_refetch(&2));
        assert!(!even.should_refetch(&3));
    }
}
