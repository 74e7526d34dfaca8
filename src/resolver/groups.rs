//! Named groups of sibling node executions and their labels.

use serde::{Deserialize, Serialize};

use crate::models::NodeExecution;

/// Named bucket of sibling node executions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionGroup {
    pub name: String,
    pub node_executions: Vec<NodeExecution>,
}

impl NodeExecutionGroup {
    pub fn new(name: impl Into<String>, node_executions: Vec<NodeExecution>) -> Self {
        Self {
            name: name.into(),
            node_executions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node_executions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.node_executions.len()
    }
}

/// Display label for a zero-based retry attempt
pub fn format_retry_attempt(attempt: u32) -> String {
    format!("Attempt {:02}", u64::from(attempt) + 1)
}

/// Labels for the retry groups carried in node execution metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttemptLabels {
    default_label: String,
}

impl Default for RetryAttemptLabels {
    fn default() -> Self {
        Self {
            default_label: format_retry_attempt(0),
        }
    }
}

impl RetryAttemptLabels {
    /// `default_label` names children without a retry group; `None` keeps the attempt-zero label
    pub fn new(default_label: Option<String>) -> Self {
        match default_label {
            Some(default_label) => Self { default_label },
            None => Self::default(),
        }
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Label for a retry group string. Values that are not a number count as attempt zero.
    pub fn label(&self, retry_group: Option<&str>) -> String {
        match retry_group {
            None => self.default_label.clone(),
            Some(raw) => format_retry_attempt(raw.trim().parse().unwrap_or(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_retry_attempt_is_one_based_and_padded() {
        assert_eq!(format_retry_attempt(0), "Attempt 01");
        assert_eq!(format_retry_attempt(1), "Attempt 02");
        assert_eq!(format_retry_attempt(11), "Attempt 12");
        assert_eq!(format_retry_attempt(99), "Attempt 100");
        assert_eq!(format_retry_attempt(u32::MAX), "Attempt 4294967296");
    }

    #[test]
    fn test_retry_group_labels() {
        let labels = RetryAttemptLabels::default();
        assert_eq!(labels.label(Some("0")), "Attempt 01");
        assert_eq!(labels.label(Some(" 2 ")), "Attempt 03");
        assert_eq!(labels.label(Some("garbage")), "Attempt 01");
        assert_eq!(labels.label(None), "Attempt 01");
    }

    #[test]
    fn test_configured_default_label_only_applies_to_missing_groups() {
        let labels = RetryAttemptLabels::new(Some("Initial attempt".to_string()));
        assert_eq!(labels.label(None), "Initial attempt");
        assert_eq!(labels.label(Some("0")), "Attempt 01");
    }
}
