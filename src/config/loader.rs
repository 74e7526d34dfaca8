//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate. Sources are merged in
//! this order, later sources winning:
//!
//! 1. Built-in defaults for the detected environment
//! 2. `<config_dir>/console-config.yaml` (optional)
//! 3. `<config_dir>/console-config-<environment>.yaml` (optional)
//! 4. An explicit file passed with [`ConfigLoader::with_file`] (required)
//! 5. `CONSOLE__SECTION__KEY` environment variables

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::ConsoleConfig;
use crate::constants::env as env_keys;
use crate::error::ConsoleResult;

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_directory: PathBuf,
    environment: String,
    explicit_file: Option<PathBuf>,
    read_environment: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_directory: PathBuf::from("config"),
            environment: Self::detect_environment(),
            explicit_file: None,
            read_environment: true,
        }
    }

    /// Detect environment from `CONSOLE_ENV`, then `APP_ENV`
    pub fn detect_environment() -> String {
        env::var(env_keys::CONSOLE_ENV)
            .or_else(|_| env::var(env_keys::APP_ENV))
            .unwrap_or_else(|_| "development".to_string())
    }

    pub fn with_config_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config_directory = directory.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Skip `CONSOLE__*` variables (useful for tests that must not see the host environment)
    pub fn without_environment_overrides(mut self) -> Self {
        self.read_environment = false;
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn load(&self) -> ConsoleResult<ConsoleConfig> {
        debug!(
            environment = %self.environment,
            config_directory = %self.config_directory.display(),
            "Loading console configuration"
        );

        let defaults = ConsoleConfig::for_environment(&self.environment);
        let mut builder = Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::from(self.config_directory.join("console-config.yaml")).required(false))
            .add_source(
                File::from(
                    self.config_directory
                        .join(format!("console-config-{}.yaml", self.environment)),
                )
                .required(false),
            );

        if let Some(path) = &self.explicit_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        if self.read_environment {
            builder = builder.add_source(
                Environment::with_prefix(env_keys::CONFIG_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: ConsoleConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %self.environment,
            base_url = %config.api.base_url,
            cache_enabled = config.query_cache.enabled,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}
