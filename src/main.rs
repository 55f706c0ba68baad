use static_site_stack::config::{DEFAULT_PROJECT, DEFAULT_STACK};
use static_site_stack::{Config, InMemoryProvider, StackError, apply, static_website};

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// static-site-stack: declare a static website's infrastructure
#[derive(Parser, Debug)]
#[command(name = "static-site-stack")]
#[command(about = "Declare the storage, CDN and notification stack of a static website", long_about = None)]
struct Cli {
    /// Stack settings file (YAML, or JSON with a .json extension)
    #[arg(short, long, env = "STACK_CONFIG")]
    config: Option<PathBuf>,

    /// Project name; namespaces configuration keys
    #[arg(long, env = "STACK_PROJECT", default_value = DEFAULT_PROJECT)]
    project: String,

    /// Stack name
    #[arg(short, long, env = "STACK_NAME", default_value = DEFAULT_STACK)]
    stack: String,

    /// Configuration override, e.g. --set indexDocument=home.html
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the desired-state document
    Preview,
    /// Apply the stack against the in-memory provider and print its outputs
    Up,
    /// Print the exported output templates
    Outputs,
}

fn load_config(cli: &Cli) -> Result<Config, StackError> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path, &cli.project, &cli.stack)?;
            tracing::info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::new(cli.project.as_str(), cli.stack.as_str()),
    };

    for pair in &cli.overrides {
        config.set_pair(pair)?;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), StackError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), StackError> {
    let config = load_config(&cli)?;
    let stack = static_website(&config)?;

    match cli.command {
        Command::Preview => print_json(&stack.render()?),
        Command::Outputs => {
            stack.graph()?;
            print_json(stack.outputs())
        }
        Command::Up => {
            let provider = Arc::new(InMemoryProvider::new(config.region.as_str()));
            match apply(&stack, provider).await {
                Ok(result) => print_json(&result),
                Err(e) => {
                    for name in e.created.keys() {
                        tracing::warn!("'{}' was created before the failure", name);
                    }
                    Err(e.source)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the JSON documents
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
