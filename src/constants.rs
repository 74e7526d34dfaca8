//! # System Constants
//!
//! Reserved identifiers and request parameter names shared with the
//! orchestration engine.

/// Node id the engine injects as the entry point of every workflow graph
pub const START_NODE_ID: &str = "start-node";

/// Node id the engine injects as the exit point of every workflow graph
pub const END_NODE_ID: &str = "end-node";

/// Control nodes that are never shown as children
pub const SYSTEM_NODE_IDS: [&str; 2] = [START_NODE_ID, END_NODE_ID];

/// Query parameters understood by the node execution list endpoint
pub mod node_execution_query_params {
    /// Restricts a node execution list to the children of one parent node
    pub const PARENT_NODE_ID: &str = "parent_node_id";
}

/// Environment variable names read by the configuration and logging layers
pub mod env {
    pub const CONSOLE_ENV: &str = "CONSOLE_ENV";
    pub const APP_ENV: &str = "APP_ENV";
    pub const LOG_FORMAT: &str = "CONSOLE_LOG_FORMAT";
    /// Prefix for `config` crate environment overrides (`CONSOLE__API__BASE_URL`)
    pub const CONFIG_PREFIX: &str = "CONSOLE";
}
