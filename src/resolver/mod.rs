//! # Child-Group Resolution
//!
//! Decides how the children of a node execution are fetched and groups them
//! by retry attempt or sub-workflow execution.

pub mod child_group_resolver;
pub mod groups;
pub mod strategy;

pub use groups::{format_retry_attempt, NodeExecutionGroup, RetryAttemptLabels};
pub use child_group_resolver::ChildGroupResolver;
pub use strategy::ChildFetchStrategy;
