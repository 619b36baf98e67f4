//! Control-plane backend abstraction
//!
//! The planner talks to the control plane only through this trait. The HTTP
//! implementation lives in `sluice-client`; tests use in-memory fakes.

use async_trait::async_trait;

use crate::domain::pipeline::{ConfigId, PipelineId, RunState};
use crate::dto::pipeline::{CreatedPipeline, PipelineDescription};
use crate::error::BackendError;

/// Result type alias for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Operations the planner needs from the control plane
#[async_trait]
pub trait Backend: Send + Sync {
    /// Creates a pipeline inside a virtual cluster
    ///
    /// # Returns
    /// The new pipeline ID and the type as resolved by the control plane
    async fn create_pipeline(
        &self,
        virtual_cluster_id: &str,
        name: &str,
        pipeline_type: &str,
    ) -> BackendResult<CreatedPipeline>;

    /// Creates the next configuration version of a pipeline
    async fn create_configuration_version(
        &self,
        pipeline_id: &PipelineId,
        content: &str,
    ) -> BackendResult<ConfigId>;

    /// Points the pipeline's deployment at a configuration in the given run state
    async fn set_deployment(
        &self,
        pipeline_id: &PipelineId,
        config_id: &ConfigId,
        run_state: RunState,
    ) -> BackendResult<()>;

    /// Fetches the pipeline overview and all of its configuration versions
    async fn describe_pipeline(&self, pipeline_id: &PipelineId)
    -> BackendResult<PipelineDescription>;

    /// Deletes a pipeline
    async fn delete_pipeline(&self, pipeline_id: &PipelineId) -> BackendResult<()>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for std::sync::Arc<T> {
    async fn create_pipeline(
        &self,
        virtual_cluster_id: &str,
        name: &str,
        pipeline_type: &str,
    ) -> BackendResult<CreatedPipeline> {
        (**self)
            .create_pipeline(virtual_cluster_id, name, pipeline_type)
            .await
    }

    async fn create_configuration_version(
        &self,
        pipeline_id: &PipelineId,
        content: &str,
    ) -> BackendResult<ConfigId> {
        (**self)
            .create_configuration_version(pipeline_id, content)
            .await
    }

    async fn set_deployment(
        &self,
        pipeline_id: &PipelineId,
        config_id: &ConfigId,
        run_state: RunState,
    ) -> BackendResult<()> {
        (**self)
            .set_deployment(pipeline_id, config_id, run_state)
            .await
    }

    async fn describe_pipeline(
        &self,
        pipeline_id: &PipelineId,
    ) -> BackendResult<PipelineDescription> {
        (**self).describe_pipeline(pipeline_id).await
    }

    async fn delete_pipeline(&self, pipeline_id: &PipelineId) -> BackendResult<()> {
        (**self).delete_pipeline(pipeline_id).await
    }
}
