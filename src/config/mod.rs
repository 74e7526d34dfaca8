//! # Console Configuration System
//!
//! Layered configuration for the console data layer: built-in defaults for the
//! detected environment, optional YAML files, then `CONSOLE__*` environment
//! variables. See [`ConfigLoader`] for the exact source order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use execution_console::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! println!("API base URL: {}", config.api.base_url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod query_cache_config;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConsoleError, ConsoleResult};

pub use loader::ConfigLoader;
pub use query_cache_config::{CacheTypeConfig, QueryCacheConfig};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiClientConfig,
    #[serde(default)]
    pub query_cache: QueryCacheConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Connection settings for the orchestration API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClientConfig {
    /// Base URL for the API (e.g., "<http://localhost:8088>")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum attempts for requests failing with a network error or 5xx
    pub max_retries: u32,
    /// Bearer token sent with every request (if required)
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8088".to_string(),
            timeout_ms: 30000,
            max_retries: 3,
            auth_token: None,
        }
    }
}

impl ApiClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Child-group resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Group label for parent-node children that carry no retry group.
    /// When unset the label of retry attempt zero is used.
    #[serde(default)]
    pub default_retry_group_label: Option<String>,
}

impl ConsoleConfig {
    /// Built-in defaults for an environment name
    pub fn for_environment(environment: &str) -> Self {
        Self {
            api: ApiClientConfig::default(),
            query_cache: QueryCacheConfig::for_environment(environment),
            resolver: ResolverConfig::default(),
        }
    }

    pub fn validate(&self) -> ConsoleResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConsoleError::configuration("api.base_url must not be empty"));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConsoleError::configuration(
                "api.timeout_ms must be greater than 0",
            ));
        }
        if self.api.max_retries == 0 {
            return Err(ConsoleError::configuration(
                "api.max_retries must be at least 1",
            ));
        }
        if let Some(label) = &self.resolver.default_retry_group_label {
            if label.trim().is_empty() {
                return Err(ConsoleError::configuration(
                    "resolver.default_retry_group_label must not be blank when set",
                ));
            }
        }
        self.query_cache
            .validate()
            .map_err(ConsoleError::Configuration)
    }
}
