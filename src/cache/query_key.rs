//! Composite cache keys.
//!
//! A key is the query type plus the canonical JSON of every parameter that
//! affects the result. Keys built from deeply-equal parameters compare equal
//! regardless of where the parameters came from.

use serde::Serialize;
use std::fmt;

use crate::error::ConsoleResult;

/// Kinds of cached queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryType {
    NodeExecution,
    NodeExecutionList,
    NodeExecutionChildList,
    TaskExecutionList,
    TaskExecutionChildList,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeExecution => "nodeExecution",
            Self::NodeExecutionList => "nodeExecutionList",
            Self::NodeExecutionChildList => "nodeExecutionChildList",
            Self::TaskExecutionList => "taskExecutionList",
            Self::TaskExecutionChildList => "taskExecutionChildList",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    query_type: QueryType,
    fingerprint: String,
}

impl QueryKey {
    /// Build a key from the query type and its parameters
    pub fn new<P: Serialize + ?Sized>(query_type: QueryType, params: &P) -> ConsoleResult<Self> {
        Ok(Self {
            query_type,
            fingerprint: serde_json::to_string(params)?,
        })
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.query_type, self.fingerprint)
    }
}
