//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod builders;
pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use execution_console::api::InMemoryExecutionApi;
use execution_console::config::QueryCacheConfig;
use execution_console::{ChildGroupResolver, QueryClient};

/// Resolver over `api` whose caches never serve fresh values, so every
/// resolution reaches the API
pub fn uncached_resolver(api: &InMemoryExecutionApi) -> ChildGroupResolver {
    ChildGroupResolver::new(QueryClient::new(
        Arc::new(api.clone()),
        &QueryCacheConfig::for_test(),
    ))
}

/// Resolver over `api` whose caches keep everything for a minute
pub fn caching_resolver(api: &InMemoryExecutionApi) -> ChildGroupResolver {
    ChildGroupResolver::new(QueryClient::with_uniform_ttl(
        Arc::new(api.clone()),
        Duration::from_secs(60),
    ))
}

/// Resolver over `api` with the production cache profile
pub fn default_resolver(api: &InMemoryExecutionApi) -> ChildGroupResolver {
    ChildGroupResolver::new(QueryClient::new(
        Arc::new(api.clone()),
        &QueryCacheConfig::default(),
    ))
}
