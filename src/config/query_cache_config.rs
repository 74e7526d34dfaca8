//! Query Cache Configuration Management
//!
//! Environment-specific cache behavior. Each query kind gets its own TTL and
//! capacity: entries younger than the TTL are served without a network call,
//! older ones are refetched on the next request. A TTL of zero means every
//! request refetches and the cache only de-duplicates concurrent fetches and
//! keeps the last value around for observers.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::env as env_keys;

/// Configuration for query cache behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCacheConfig {
    pub enabled: bool,
    pub node_executions: CacheTypeConfig,
    pub node_execution_lists: CacheTypeConfig,
    pub task_execution_lists: CacheTypeConfig,
    pub task_execution_children: CacheTypeConfig,
    pub child_groups: CacheTypeConfig,
}

/// Configuration for a specific type of cached data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTypeConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl CacheTypeConfig {
    pub const fn new(ttl_seconds: u64, max_entries: usize) -> Self {
        Self {
            ttl_seconds,
            max_entries,
        }
    }

    /// Get TTL as Duration
    pub fn ttl_duration(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for QueryCacheConfig {
    /// Default configuration suitable for production
    fn default() -> Self {
        Self {
            enabled: true,
            node_executions: CacheTypeConfig::new(2, 2000),
            node_execution_lists: CacheTypeConfig::new(2, 500),
            task_execution_lists: CacheTypeConfig::new(2, 500),
            task_execution_children: CacheTypeConfig::new(2, 500),
            // Child groups freshness is decided by the refresh policy
            child_groups: CacheTypeConfig::new(0, 500),
        }
    }
}

impl QueryCacheConfig {
    /// Test configuration: nothing is ever fresh, so every fetch reaches the API
    pub fn for_test() -> Self {
        Self {
            enabled: true,
            node_executions: CacheTypeConfig::new(0, 100),
            node_execution_lists: CacheTypeConfig::new(0, 100),
            task_execution_lists: CacheTypeConfig::new(0, 100),
            task_execution_children: CacheTypeConfig::new(0, 100),
            child_groups: CacheTypeConfig::new(0, 100),
        }
    }

    pub fn for_development() -> Self {
        Self {
            enabled: true,
            node_executions: CacheTypeConfig::new(1, 500),
            node_execution_lists: CacheTypeConfig::new(1, 200),
            task_execution_lists: CacheTypeConfig::new(1, 200),
            task_execution_children: CacheTypeConfig::new(1, 200),
            child_groups: CacheTypeConfig::new(0, 200),
        }
    }

    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "test" => Self::for_test(),
            "development" => Self::for_development(),
            _ => Self::default(),
        }
    }

    /// Load configuration from environment or use defaults
    pub fn from_environment() -> Self {
        let environment = env::var(env_keys::CONSOLE_ENV)
            .or_else(|_| env::var(env_keys::APP_ENV))
            .unwrap_or_else(|_| "production".to_string());

        info!(environment = %environment, "Loading query cache configuration");
        Self::for_environment(&environment).with_env_overrides()
    }

    /// Apply environment variable overrides to configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(enabled) = env::var("CONSOLE_QUERY_CACHE_ENABLED") {
            self.enabled = enabled.parse().unwrap_or(self.enabled);
            info!("Query cache enabled override: {}", self.enabled);
        }

        if let Ok(ttl) = env::var("CONSOLE_QUERY_CACHE_LIST_TTL_SECONDS") {
            if let Ok(seconds) = ttl.parse::<u64>() {
                self.node_execution_lists.ttl_seconds = seconds;
                self.task_execution_lists.ttl_seconds = seconds;
                self.task_execution_children.ttl_seconds = seconds;
                info!("List query cache TTL override: {}s", seconds);
            }
        }

        if let Ok(max) = env::var("CONSOLE_QUERY_CACHE_MAX_ENTRIES") {
            if let Ok(entries) = max.parse::<usize>() {
                for cache in self.cache_types_mut() {
                    cache.max_entries = entries;
                }
                info!("Query cache max entries override: {}", entries);
            }
        }

        self
    }

    fn cache_types_mut(&mut self) -> [&mut CacheTypeConfig; 5] {
        [
            &mut self.node_executions,
            &mut self.node_execution_lists,
            &mut self.task_execution_lists,
            &mut self.task_execution_children,
            &mut self.child_groups,
        ]
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!("Query Cache Configuration:");
        info!("  Enabled: {}", self.enabled);
        for (name, cache) in [
            ("Node Executions", &self.node_executions),
            ("Node Execution Lists", &self.node_execution_lists),
            ("Task Execution Lists", &self.task_execution_lists),
            ("Task Execution Children", &self.task_execution_children),
            ("Child Groups", &self.child_groups),
        ] {
            info!(
                "  {}: {}s TTL, {} max entries",
                name, cache.ttl_seconds, cache.max_entries
            );
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, cache) in [
            ("node_executions", &self.node_executions),
            ("node_execution_lists", &self.node_execution_lists),
            ("task_execution_lists", &self.task_execution_lists),
            ("task_execution_children", &self.task_execution_children),
            ("child_groups", &self.child_groups),
        ] {
            if self.enabled && cache.max_entries == 0 {
                return Err(format!(
                    "query_cache.{name}.max_entries must be greater than 0 when caching is enabled"
                ));
            }
        }

        if self.child_groups.ttl_seconds > 0 {
            warn!(
                ttl_seconds = self.child_groups.ttl_seconds,
                "Child group cache TTL is non-zero - running node executions may show stale children"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_profiles() {
        assert_eq!(QueryCacheConfig::for_environment("test"), QueryCacheConfig::for_test());
        assert_eq!(
            QueryCacheConfig::for_environment("development"),
            QueryCacheConfig::for_development()
        );
        assert_eq!(
            QueryCacheConfig::for_environment("staging"),
            QueryCacheConfig::default()
        );
    }

    #[test]
    fn test_test_profile_never_serves_fresh_entries() {
        let config = QueryCacheConfig::for_test();
        assert_eq!(config.node_execution_lists.ttl_duration(), Duration::ZERO);
        assert_eq!(config.child_groups.ttl_duration(), Duration::ZERO);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = QueryCacheConfig::default();
        config.child_groups.max_entries = 0;
        assert!(config.validate().is_err());

        config.enabled = false;
        assert!(config.validate().is_ok());
    }
}
