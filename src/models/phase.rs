use serde::{Deserialize, Serialize};
use std::fmt;

/// Node execution phase as reported by the orchestration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeExecutionPhase {
    #[default]
    Undefined,
    Queued,
    Running,
    Succeeded,
    Failing,
    Failed,
    Aborted,
    Skipped,
    TimedOut,
    DynamicRunning,
    Recovered,
}

impl NodeExecutionPhase {
    /// Check if this is a terminal phase (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded
                | Self::Failed
                | Self::Aborted
                | Self::Skipped
                | Self::TimedOut
                | Self::Recovered
        )
    }

    /// Check if this is an active phase (node is being processed)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Queued | Self::Running | Self::Failing | Self::DynamicRunning
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "UNDEFINED",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failing => "FAILING",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
            Self::Skipped => "SKIPPED",
            Self::TimedOut => "TIMED_OUT",
            Self::DynamicRunning => "DYNAMIC_RUNNING",
            Self::Recovered => "RECOVERED",
        }
    }
}

impl fmt::Display for NodeExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task execution (attempt) phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskExecutionPhase {
    #[default]
    Undefined,
    Queued,
    Running,
    Succeeded,
    Aborted,
    Failed,
    Initializing,
    WaitingForResources,
}

impl TaskExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Aborted | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "UNDEFINED",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Aborted => "ABORTED",
            Self::Failed => "FAILED",
            Self::Initializing => "INITIALIZING",
            Self::WaitingForResources => "WAITING_FOR_RESOURCES",
        }
    }
}

impl fmt::Display for TaskExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
