//! # Query Cache
//!
//! Typed, key-addressed caches for every kind of query the console issues.
//! Keys have deep-equality semantics (see [`QueryKey`]) and concurrent requests
//! for an equal key share a single in-flight fetch.

pub mod query_cache;
pub mod query_key;

pub use query_cache::{CacheStats, FetchMode, QueryResultCache};
pub use query_key::{QueryKey, QueryType};
