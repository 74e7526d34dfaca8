use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::TaskExecutionIdentifier;
use super::phase::TaskExecutionPhase;

/// One attempt of a task invoked by a node execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecution {
    pub id: TaskExecutionIdentifier,
    #[serde(default)]
    pub input_uri: String,
    /// Set when this attempt spawned child node executions (array/map tasks)
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub closure: TaskExecutionClosure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionClosure {
    #[serde(default)]
    pub phase: TaskExecutionPhase,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskExecution {
    pub fn new(id: TaskExecutionIdentifier, phase: TaskExecutionPhase, is_parent: bool) -> Self {
        Self {
            id,
            input_uri: String::new(),
            is_parent,
            closure: TaskExecutionClosure {
                phase,
                ..Default::default()
            },
        }
    }

    pub fn retry_attempt(&self) -> u32 {
        self.id.retry_attempt
    }

    pub fn is_terminal(&self) -> bool {
        self.closure.phase.is_terminal()
    }
}
