//! # Execution Models
//!
//! Immutable value snapshots returned by the orchestration API. Nothing in the
//! crate mutates a fetched entity in place; updates arrive as new snapshots from
//! a refetch.

pub mod identifiers;
pub mod node_execution;
pub mod phase;
pub mod request_config;
pub mod task_execution;

pub use identifiers::{
    NodeExecutionIdentifier, TaskExecutionIdentifier, TaskIdentifier, WorkflowExecutionIdentifier,
};
pub use node_execution::{
    CatalogCacheStatus, NodeExecution, NodeExecutionClosure, NodeExecutionMetadata,
    TaskNodeMetadata, WorkflowNodeMetadata,
};
pub use phase::{NodeExecutionPhase, TaskExecutionPhase};
pub use request_config::{
    FilterExpression, FilterOperation, FilterValue, PaginatedEntities, RequestConfig, SortDirection,
    SortSpec,
};
pub use task_execution::{TaskExecution, TaskExecutionClosure};
