//! # Execution Console CLI
//!
//! Command-line access to the console data layer: resolve the child groups of a
//! node execution, list the node executions of a workflow execution, or fetch a
//! single node execution. Talks to the orchestration API over HTTP, or serves a
//! JSON fixture file with `--fixtures`.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use execution_console::api::{ExecutionApi, ExecutionFixtures, HttpExecutionApi, InMemoryExecutionApi};
use execution_console::config::ConfigLoader;
use execution_console::constants::node_execution_query_params::PARENT_NODE_ID;
use execution_console::models::{
    NodeExecution, NodeExecutionIdentifier, RequestConfig, WorkflowExecutionIdentifier,
};
use execution_console::{ChildFetchStrategy, ChildGroupResolver, NodeExecutionGroup, QueryClient};

#[derive(Parser, Debug)]
#[command(name = "execution-console")]
#[command(about = "Inspect workflow node executions and their children")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path (merged over config/console-config*.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long)]
    host: Option<String>,

    /// Serve responses from a JSON fixture file instead of the API
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, clap::Args)]
struct ExecutionArgs {
    /// Project of the workflow execution
    #[arg(short, long)]
    project: String,
    /// Domain of the workflow execution
    #[arg(short, long)]
    domain: String,
    /// Name of the workflow execution
    #[arg(short, long)]
    execution: String,
}

impl ExecutionArgs {
    fn identifier(&self) -> WorkflowExecutionIdentifier {
        WorkflowExecutionIdentifier::new(&self.project, &self.domain, &self.execution)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve and print the child groups of a node execution
    Children {
        #[command(flatten)]
        execution: ExecutionArgs,
        /// Node id of the node execution
        #[arg(short, long)]
        node_id: String,
    },
    /// List node executions of a workflow execution
    NodeExecutions {
        #[command(flatten)]
        execution: ExecutionArgs,
        /// Only list children of this parent node
        #[arg(long)]
        parent_node_id: Option<String>,
        /// Limit number of results
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Get a single node execution
    NodeExecution {
        #[command(flatten)]
        execution: ExecutionArgs,
        /// Node id of the node execution
        #[arg(short, long)]
        node_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(host) = &cli.host {
        config.api.base_url = host.clone();
    }

    let api: Arc<dyn ExecutionApi> = match &cli.fixtures {
        Some(path) => Arc::new(InMemoryExecutionApi::from_fixtures(
            ExecutionFixtures::from_json_file(path)
                .with_context(|| format!("failed to load fixtures from {}", path.display()))?,
        )),
        None => Arc::new(HttpExecutionApi::new(config.api.clone())?),
    };

    info!(
        backend = api.backend_name(),
        base_url = %config.api.base_url,
        "Execution console starting"
    );

    let client = QueryClient::new(api, &config.query_cache);
    let resolver = ChildGroupResolver::with_config(client.clone(), &config.resolver);

    match cli.command {
        Commands::Children { execution, node_id } => {
            let id = NodeExecutionIdentifier::new(execution.identifier(), node_id);
            let node_execution = client.fetch_node_execution(&id).await?;
            let strategy = ChildFetchStrategy::classify(&node_execution);
            let groups = resolver
                .fetch_child_groups(&node_execution, &RequestConfig::new())
                .await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&groups)?),
                OutputFormat::Table => print_groups(&node_execution, strategy, &groups),
            }
        }
        Commands::NodeExecutions {
            execution,
            parent_node_id,
            limit,
        } => {
            let mut request = RequestConfig::new();
            if let Some(parent_node_id) = parent_node_id {
                request = request.with_param(PARENT_NODE_ID, parent_node_id);
            }
            if let Some(limit) = limit {
                request = request.with_limit(limit);
            }
            let node_executions = client
                .fetch_node_execution_list(&execution.identifier(), &request)
                .await?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&node_executions)?)
                }
                OutputFormat::Table => {
                    for node_execution in &node_executions {
                        println!("{}", node_row(node_execution));
                    }
                }
            }
        }
        Commands::NodeExecution { execution, node_id } => {
            let id = NodeExecutionIdentifier::new(execution.identifier(), node_id);
            let node_execution = client.fetch_node_execution(&id).await?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&node_execution)?)
                }
                OutputFormat::Table => println!("{}", node_row(&node_execution)),
            }
        }
    }

    Ok(())
}

fn node_row(node_execution: &NodeExecution) -> String {
    format!(
        "{:<40} {:<16} {}",
        node_execution.id.node_id,
        node_execution.phase().as_str(),
        node_execution.retry_group().unwrap_or("-")
    )
}

fn print_groups(
    node_execution: &NodeExecution,
    strategy: ChildFetchStrategy,
    groups: &[NodeExecutionGroup],
) {
    println!(
        "{} ({}, {} group(s))",
        node_execution.id,
        strategy,
        groups.len()
    );
    for group in groups {
        println!("{} ({})", group.name, group.node_executions.len());
        for child in &group.node_executions {
            println!("  {}", node_row(child));
        }
    }
}
