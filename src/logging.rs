//! # Structured Logging Module
//!
//! Environment-aware structured logging for the console data layer. Query cache
//! and resolver operations log through the helpers below so that every line
//! carries the same field names.

use chrono::Utc;
use std::sync::OnceLock;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::env as env_keys;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` takes precedence over the environment's default level. Set
/// `CONSOLE_LOG_FORMAT=json` for machine-readable output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var(env_keys::LOG_FORMAT)
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = console_layer(json, filter, std::io::stderr);

        // A subscriber may already be installed by the embedding application
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Formatting layer for either output format, writing to `writer`
fn console_layer<S, W>(json: bool, filter: EnvFilter, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(writer);
    if json {
        layer.with_ansi(false).json().with_filter(filter).boxed()
    } else {
        layer.with_filter(filter).boxed()
    }
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_keys::CONSOLE_ENV)
        .or_else(|_| std::env::var(env_keys::APP_ENV))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for query cache operations
pub fn log_query_operation(
    operation: &str,
    query_type: &str,
    key: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::debug!(
        operation = %operation,
        query_type = %query_type,
        key = %key,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "QUERY_OPERATION"
    );
}

/// Log structured data for child-group resolution
pub fn log_resolver_operation(
    operation: &str,
    node_execution_id: &str,
    strategy: &str,
    status: &str,
    group_count: Option<usize>,
) {
    tracing::info!(
        operation = %operation,
        node_execution_id = %node_execution_id,
        strategy = %strategy,
        status = %status,
        group_count = group_count,
        timestamp = %Utc::now().to_rfc3339(),
        "RESOLVER_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
