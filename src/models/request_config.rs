//! # Request Configuration
//!
//! Filter, pagination and host options threaded through every list fetch.
//!
//! A `RequestConfig` is part of the cache identity of every list query, so its
//! serialized form must be deterministic: extra parameters live in a `BTreeMap`
//! and filters keep caller order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Comparison applied by a [`FilterExpression`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperation {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    ValueIn,
}

impl FilterOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::ValueIn => "value_in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterExpression {
    pub key: String,
    pub operation: FilterOperation,
    pub value: FilterValue,
}

/// Right-hand side of a filter; `ValueIn` takes a list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    List(Vec<String>),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::List(values) => f.write_str(&values.join(";")),
        }
    }
}

impl FilterExpression {
    pub fn new(key: impl Into<String>, operation: FilterOperation, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operation,
            value: FilterValue::Single(value.into()),
        }
    }

    pub fn value_in<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            operation: FilterOperation::ValueIn,
            value: FilterValue::List(values.into_iter().map(Into::into).collect()),
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.operation.as_str(), self.key, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterExpression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Alternate API endpoint for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this config with one extra query parameter
    pub fn with_param(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut config = self.clone();
        config.params.insert(key.into(), value.into());
        config
    }

    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter.push(filter);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            key: key.into(),
            direction,
        });
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Filters rendered the way the list endpoints expect (`op(key,value)+...`)
    pub fn filter_string(&self) -> Option<String> {
        if self.filter.is_empty() {
            return None;
        }
        Some(
            self.filter
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+"),
        )
    }
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedEntities<T> {
    pub entities: Vec<T>,
    #[serde(default)]
    pub token: Option<String>,
}

impl<T> PaginatedEntities<T> {
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            entities,
            token: None,
        }
    }
}
