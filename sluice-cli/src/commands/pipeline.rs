//! Pipeline command handlers
//!
//! Plans, applies, inspects, imports and destroys pipelines described by a
//! declaration file, keeping observed state in a local JSON state file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use sluice_client::ControlPlaneClient;
use sluice_core::domain::declaration::PipelineDeclaration;
use sluice_core::domain::pipeline::{Pipeline, PipelineId};
use sluice_core::{Action, Plan, Planner};

use crate::config::Config;
use crate::retry::read_with_retry;
use crate::state;

const DEFAULT_STATE_FILE: &str = "sluice-state.json";

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Show the actions needed to reach the declared state
    Plan {
        /// Path to the pipeline declaration (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the state file
        #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,

        /// Re-read remote state before planning
        #[arg(long)]
        refresh: bool,
    },
    /// Apply the declared state and record the result
    Apply {
        /// Path to the pipeline declaration (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the state file
        #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,

        /// Re-read remote state before planning
        #[arg(long)]
        refresh: bool,
    },
    /// Show the recorded state
    Show {
        /// Path to the state file
        #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,

        /// Re-read remote state and update the state file
        #[arg(long)]
        refresh: bool,
    },
    /// Record an existing remote pipeline in a new state file
    Import {
        /// Pipeline ID on the control plane
        id: String,

        /// Path to the state file
        #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,
    },
    /// Delete the remote pipeline and its state file
    Destroy {
        /// Path to the state file
        #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,
    },
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let planner = Planner::new(config.client());

    match command {
        PipelineCommands::Plan {
            file,
            state,
            refresh,
        } => plan_pipeline(&planner, config, &file, &state, refresh).await,
        PipelineCommands::Apply {
            file,
            state,
            refresh,
        } => apply_pipeline(&planner, config, &file, &state, refresh).await,
        PipelineCommands::Show { state, refresh } => {
            show_pipeline(&planner, config, &state, refresh).await
        }
        PipelineCommands::Import { id, state } => {
            import_pipeline(&planner, config, &id, &state).await
        }
        PipelineCommands::Destroy { state } => destroy_pipeline(&planner, &state).await,
    }
}

/// Print the plan without touching the control plane beyond an optional refresh
async fn plan_pipeline(
    planner: &Planner<ControlPlaneClient>,
    config: &Config,
    file: &Path,
    state_path: &Path,
    refresh: bool,
) -> Result<()> {
    let desired = load_declaration(file)?;
    let observed = load_observed(planner, config, state_path, refresh).await?;

    let plan = planner
        .plan(&desired, observed.as_ref())
        .context("Failed to plan pipeline")?;

    print_plan(&plan);

    Ok(())
}

/// Plan and apply, then record the resulting state
async fn apply_pipeline(
    planner: &Planner<ControlPlaneClient>,
    config: &Config,
    file: &Path,
    state_path: &Path,
    refresh: bool,
) -> Result<()> {
    let desired = load_declaration(file)?;
    let observed = load_observed(planner, config, state_path, refresh).await?;

    let plan = planner
        .plan(&desired, observed.as_ref())
        .context("Failed to plan pipeline")?;

    print_plan(&plan);

    if plan.is_noop() {
        if let Some(observed) = &observed {
            state::save(state_path, observed)?;
        }
        return Ok(());
    }

    match planner.apply(plan).await {
        Ok(pipeline) => {
            state::save(state_path, &pipeline)?;

            println!();
            println!("{}", "✓ Pipeline applied successfully!".green().bold());
            print_pipeline_details(&pipeline);
            Ok(())
        }
        Err(err) => {
            if let Some(partial) = &err.partial {
                state::save(state_path, partial)?;
                eprintln!(
                    "{}",
                    format!(
                        "Partial state after {} action(s) written to {}",
                        err.completed,
                        state_path.display()
                    )
                    .yellow()
                );
            }
            Err(anyhow::Error::new(err)).context("Failed to apply pipeline")
        }
    }
}

/// Print the recorded state, optionally refreshed from the control plane
async fn show_pipeline(
    planner: &Planner<ControlPlaneClient>,
    config: &Config,
    state_path: &Path,
    refresh: bool,
) -> Result<()> {
    let mut pipeline = state::load_required(state_path)?;

    if refresh {
        let id = require_id(&pipeline)?;
        pipeline = read_with_retry(planner, &id, Some(&pipeline), config.read_retries).await?;
        state::save(state_path, &pipeline)?;
    }

    print_pipeline_details(&pipeline);

    Ok(())
}

/// Read a remote pipeline into a new state file
async fn import_pipeline(
    planner: &Planner<ControlPlaneClient>,
    config: &Config,
    id: &str,
    state_path: &Path,
) -> Result<()> {
    if state_path.exists() {
        anyhow::bail!(
            "State file {} already exists; refusing to overwrite it",
            state_path.display()
        );
    }

    let id = PipelineId::from(id);
    let pipeline = read_with_retry(planner, &id, None, config.read_retries).await?;
    state::save(state_path, &pipeline)?;

    println!("{}", "✓ Pipeline imported successfully!".green().bold());
    print_pipeline_details(&pipeline);

    Ok(())
}

/// Delete the remote pipeline and forget its state
async fn destroy_pipeline(planner: &Planner<ControlPlaneClient>, state_path: &Path) -> Result<()> {
    let pipeline = state::load_required(state_path)?;

    match &pipeline.id {
        Some(id) => {
            planner
                .delete(id)
                .await
                .with_context(|| format!("Failed to delete pipeline {}", id))?;
            println!(
                "{}",
                format!("✓ Pipeline {} deleted successfully!", id).green().bold()
            );
        }
        None => {
            println!(
                "{}",
                format!("Pipeline '{}' was never created.", pipeline.name).yellow()
            );
        }
    }

    state::remove(state_path)
}

// =============================================================================
// Helpers
// =============================================================================

fn load_declaration(path: &Path) -> Result<PipelineDeclaration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read declaration file: {}", path.display()))?;

    PipelineDeclaration::from_yaml(&text)
        .with_context(|| format!("Failed to parse declaration file: {}", path.display()))
}

/// Recorded state, re-read from the control plane when `refresh` is set
async fn load_observed(
    planner: &Planner<ControlPlaneClient>,
    config: &Config,
    state_path: &Path,
    refresh: bool,
) -> Result<Option<Pipeline>> {
    let recorded = state::load(state_path)?;

    match recorded {
        Some(prior) if refresh && prior.id.is_some() => {
            let id = require_id(&prior)?;
            let pipeline = read_with_retry(planner, &id, Some(&prior), config.read_retries).await?;
            Ok(Some(pipeline))
        }
        recorded => Ok(recorded),
    }
}

fn require_id(pipeline: &Pipeline) -> Result<PipelineId> {
    pipeline
        .id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Pipeline '{}' has not been created yet", pipeline.name))
}

// =============================================================================
// Output
// =============================================================================

fn print_plan(plan: &Plan) {
    if plan.is_noop() {
        println!(
            "{}",
            format!("✓ Pipeline '{}' is up to date.", plan.name()).green()
        );
        return;
    }

    println!(
        "{}",
        format!(
            "Plan for pipeline '{}': {} action(s)",
            plan.name(),
            plan.actions().len()
        )
        .bold()
    );
    for action in plan.actions() {
        let line = action.to_string();
        match action {
            Action::CreatePipeline { .. } | Action::CreateVersion { .. } => {
                println!("  {} {}", "+".green(), line)
            }
            Action::SetDeployment { .. } => println!("  {} {}", "~".yellow(), line),
        }
    }
}

fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    match &pipeline.id {
        Some(id) => println!("  ID:              {}", id.to_string().cyan()),
        None => println!("  ID:              {}", "(not created)".dimmed()),
    }
    println!("  Name:            {}", pipeline.name.bold());
    println!("  Type:            {}", pipeline.pipeline_type);
    if let Some(resolved) = &pipeline.resolved_type {
        if *resolved != pipeline.pipeline_type {
            println!("  Resolved type:   {}", resolved.dimmed());
        }
    }
    println!("  Virtual cluster: {}", pipeline.virtual_cluster_id);
    match &pipeline.deployed {
        Some(pointer) => println!(
            "  Deployed:        version {} ({})",
            pointer.version_index.to_string().cyan(),
            pointer.run_state.to_string().yellow()
        ),
        None => println!("  Deployed:        {}", "nothing".dimmed()),
    }
    if let Some(refreshed_at) = &pipeline.refreshed_at {
        println!(
            "  Refreshed:       {}",
            refreshed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!("\n{}", format!("Versions ({}):", pipeline.version_count()).bold());
    for version in &pipeline.versions {
        let marker = match &pipeline.deployed {
            Some(pointer) if pointer.version_index == version.version => "▸".green(),
            _ => " ".normal(),
        };
        println!(
            "  {} {} {}",
            marker,
            format!("v{}", version.version).bold(),
            version
                .remote_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default()
                .dimmed()
        );
    }
}
