//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;

pub use pipeline::PipelineCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline configuration management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
    }
}
