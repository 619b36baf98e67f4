//! Pipeline Service
//!
//! Business logic for pipelines and their configuration versions.

use sluice_core::domain::pipeline::PipelineId;
use sluice_core::dto::pipeline::{
    CreateConfiguration, CreatePipeline, CreatedConfiguration, CreatedPipeline,
    PipelineDescription, SetDeployment,
};
use sluice_core::normalize::normalize;

use crate::repository::pipeline::DeploymentUpdate;
use crate::repository::pipeline_repository;
use crate::store::Store;

/// Service error type
#[derive(Debug)]
pub enum PipelineError {
    NotFound(String),
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Create a new pipeline
pub async fn create_pipeline(
    store: &Store,
    virtual_cluster_id: &str,
    req: CreatePipeline,
) -> Result<CreatedPipeline> {
    // Validate request
    validate_pipeline_request(virtual_cluster_id, &req)?;

    let resolved_type = resolve_type(&req.pipeline_type);
    let id = pipeline_repository::create(store, virtual_cluster_id, &req.name, &resolved_type).await;

    tracing::info!("Pipeline created: {} ({})", req.name, id);

    Ok(CreatedPipeline {
        id,
        pipeline_type: resolved_type,
    })
}

/// Get a pipeline with all of its configuration versions
pub async fn describe_pipeline(store: &Store, id: &PipelineId) -> Result<PipelineDescription> {
    pipeline_repository::find_by_id(store, id)
        .await
        .ok_or_else(|| PipelineError::NotFound(format!("Pipeline {} not found", id)))
}

/// Append a configuration version
pub async fn create_configuration(
    store: &Store,
    id: &PipelineId,
    req: CreateConfiguration,
) -> Result<CreatedConfiguration> {
    if let Err(e) = normalize(&req.content) {
        return Err(PipelineError::ValidationError(format!(
            "Invalid configuration: {}",
            e
        )));
    }

    let created = pipeline_repository::add_configuration(store, id, &req.content)
        .await
        .ok_or_else(|| PipelineError::NotFound(format!("Pipeline {} not found", id)))?;

    tracing::info!(
        "Configuration {} (version {}) created for pipeline {}",
        created.id,
        created.version,
        id
    );

    Ok(created)
}

/// Point a pipeline's deployment at one of its configurations
pub async fn set_deployment(store: &Store, id: &PipelineId, req: SetDeployment) -> Result<()> {
    match pipeline_repository::set_deployment(store, id, &req.configuration_id, req.state).await {
        DeploymentUpdate::Updated => {
            tracing::info!(
                "Pipeline {} deploys configuration {} ({})",
                id,
                req.configuration_id,
                req.state
            );
            Ok(())
        }
        DeploymentUpdate::PipelineMissing => {
            Err(PipelineError::NotFound(format!("Pipeline {} not found", id)))
        }
        DeploymentUpdate::ConfigurationMissing => Err(PipelineError::NotFound(format!(
            "Configuration {} not found in pipeline {}",
            req.configuration_id, id
        ))),
    }
}

/// Delete a pipeline
pub async fn delete_pipeline(store: &Store, id: &PipelineId) -> Result<()> {
    let deleted = pipeline_repository::delete(store, id).await;

    if !deleted {
        return Err(PipelineError::NotFound(format!("Pipeline {} not found", id)));
    }

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_pipeline_request(virtual_cluster_id: &str, req: &CreatePipeline) -> Result<()> {
    if virtual_cluster_id.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Virtual cluster ID cannot be empty".to_string(),
        ));
    }

    if req.name.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline name cannot be empty".to_string(),
        ));
    }

    if req.name.len() > 255 {
        return Err(PipelineError::ValidationError(
            "Pipeline name is too long (max 255 characters)".to_string(),
        ));
    }

    if req.pipeline_type.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Canonical spelling of a pipeline type
fn resolve_type(pipeline_type: &str) -> String {
    pipeline_type.trim().to_lowercase()
}
