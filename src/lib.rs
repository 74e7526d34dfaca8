#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Execution Console Core
//!
//! Data layer of a workflow execution console: fetches node executions, task
//! retries and their nested children from the orchestration API and groups
//! them for display.
//!
//! ## Overview
//!
//! The central piece is the [`ChildGroupResolver`]. Given any node execution it
//! picks one of three fetch strategies (parent-node bulk listing, sub-workflow
//! execution, task retries), runs it, and returns ordered, named groups of
//! child node executions. Every fetch goes through a [`QueryClient`], whose
//! typed caches share in-flight requests between concurrent callers.
//! Observers publish query state to subscribers and consult a refresh policy
//! before refetching a cached value.
//!
//! ## Module Organization
//!
//! - [`models`] - Execution identifiers, snapshots and request configuration
//! - [`system_nodes`] - Removal of engine-injected control nodes
//! - [`cache`] - Key-addressed query caches with in-flight de-duplication
//! - [`queries`] - Query client, refresh policies and observers
//! - [`resolver`] - Child-group resolution
//! - [`api`] - The execution API contract and its HTTP and in-memory backends
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use execution_console::api::HttpExecutionApi;
//! use execution_console::config::ConfigLoader;
//! use execution_console::models::{
//!     NodeExecutionIdentifier, RequestConfig, WorkflowExecutionIdentifier,
//! };
//! use execution_console::{ChildGroupResolver, QueryClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let api = Arc::new(HttpExecutionApi::new(config.api.clone())?);
//! let client = QueryClient::new(api, &config.query_cache);
//! let resolver = ChildGroupResolver::with_config(client.clone(), &config.resolver);
//!
//! let execution = WorkflowExecutionIdentifier::new("flytesnacks", "development", "abc123");
//! let node = client
//!     .fetch_node_execution(&NodeExecutionIdentifier::new(execution, "n0"))
//!     .await?;
//! for group in resolver.fetch_child_groups(&node, &RequestConfig::new()).await? {
//!     println!("{}: {} children", group.name, group.node_executions.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod queries;
pub mod resolver;
pub mod system_nodes;

pub use api::{ExecutionApi, HttpExecutionApi, InMemoryExecutionApi};
pub use cache::{FetchMode, QueryKey, QueryResultCache, QueryType};
pub use config::{ConfigLoader, ConsoleConfig};
pub use error::{ConsoleError, ConsoleResult, ErrorKind};
pub use queries::{
    node_execution_list_observer, AlwaysRefetch, ChildGroupRefreshPolicy, ChildGroupsObserver,
    QueryClient, QueryObserver, QueryState, RefreshPolicy,
};
pub use resolver::{format_retry_attempt, ChildFetchStrategy, ChildGroupResolver, NodeExecutionGroup};
pub use system_nodes::{filter_system_nodes, is_system_node};
