//! Pipeline API Handlers
//!
//! HTTP endpoints for pipelines, configuration versions and deployments.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sluice_core::domain::pipeline::PipelineId;
use sluice_core::dto::pipeline::{
    CreateConfiguration, CreatePipeline, CreatedConfiguration, CreatedPipeline,
    PipelineDescription, SetDeployment,
};

use crate::api::error::ApiResult;
use crate::service::pipeline_service;
use crate::store::Store;

/// POST /v1/virtual-clusters/{vc}/pipelines
/// Create a new pipeline
pub async fn create_pipeline(
    State(store): State<Store>,
    Path(virtual_cluster_id): Path<String>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<CreatedPipeline>)> {
    tracing::info!("Creating pipeline: {}", req.name);

    let created = pipeline_service::create_pipeline(&store, &virtual_cluster_id, req).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/pipelines/{id}
/// Describe a pipeline and all of its configuration versions
pub async fn describe_pipeline(
    State(store): State<Store>,
    Path(id): Path<PipelineId>,
) -> ApiResult<Json<PipelineDescription>> {
    tracing::debug!("Describing pipeline: {}", id);

    let description = pipeline_service::describe_pipeline(&store, &id).await?;

    Ok(Json(description))
}

/// DELETE /v1/pipelines/{id}
/// Delete a pipeline
pub async fn delete_pipeline(
    State(store): State<Store>,
    Path(id): Path<PipelineId>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(&store, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/pipelines/{id}/configurations
/// Create the next configuration version
pub async fn create_configuration(
    State(store): State<Store>,
    Path(id): Path<PipelineId>,
    Json(req): Json<CreateConfiguration>,
) -> ApiResult<(StatusCode, Json<CreatedConfiguration>)> {
    tracing::debug!("Creating configuration for pipeline: {}", id);

    let created = pipeline_service::create_configuration(&store, &id, req).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /v1/pipelines/{id}/deployment
/// Move the deployment pointer
pub async fn set_deployment(
    State(store): State<Store>,
    Path(id): Path<PipelineId>,
    Json(req): Json<SetDeployment>,
) -> ApiResult<StatusCode> {
    tracing::debug!("Setting deployment for pipeline: {}", id);

    pipeline_service::set_deployment(&store, &id, req).await?;

    Ok(StatusCode::NO_CONTENT)
}
