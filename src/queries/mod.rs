//! # Queries
//!
//! The [`QueryClient`] issues cached, de-duplicated fetches; refresh policies
//! decide when cached values may be reused; observers publish query state to
//! subscribers.

pub mod client;
pub mod observer;
pub mod refresh_policy;

pub use client::{QueryClient, QueryClientStats, QueryFetcher};
pub use observer::{node_execution_list_observer, ChildGroupsObserver, QueryObserver, QueryState};
pub use refresh_policy::{AlwaysRefetch, ChildGroupRefreshPolicy, RefreshPolicy};
