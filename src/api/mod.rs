//! # Execution API
//!
//! The [`ExecutionApi`] trait is the only way the data layer talks to the
//! orchestration service. [`HttpExecutionApi`] speaks its REST API;
//! [`InMemoryExecutionApi`] serves fixtures and records every call.

pub mod http;
pub mod in_memory;
pub mod traits;

pub use http::HttpExecutionApi;
pub use in_memory::{
    ApiCall, ApiEndpoint, ExecutionFixtures, InMemoryExecutionApi, ParentNodeFixture,
    TaskExecutionChildrenFixture, TaskExecutionsFixture, WorkflowExecutionFixture,
};
pub use traits::ExecutionApi;
