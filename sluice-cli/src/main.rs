//! Sluice CLI
//!
//! Command-line interface for reconciling pipeline declarations against the
//! streaming-platform control plane.

mod commands;
mod config;
mod retry;
mod state;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Sluice pipeline configuration reconciler", long_about = None)]
struct Cli {
    /// Control-plane API URL
    #[arg(long, env = "SLUICE_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Bearer token for the control-plane API
    #[arg(long, env = "SLUICE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// How often to retry reading remote state when it looks inconsistent
    #[arg(long, default_value = "5")]
    read_retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so plans and state stay readable on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
        read_retries: cli.read_retries,
    };

    handle_command(cli.command, &config).await
}
