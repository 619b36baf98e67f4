//! Pipeline-related API endpoints

use crate::ControlPlaneClient;
use crate::error::Result;
use reqwest::Method;
use sluice_core::domain::pipeline::PipelineId;
use sluice_core::dto::pipeline::{
    CreateConfiguration, CreatePipeline, CreatedConfiguration, CreatedPipeline,
    PipelineDescription, SetDeployment,
};

impl ControlPlaneClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// Create a new pipeline inside a virtual cluster
    ///
    /// # Arguments
    /// * `virtual_cluster_id` - The virtual cluster the pipeline runs in
    /// * `req` - The pipeline creation request
    ///
    /// # Returns
    /// The new pipeline ID and the type as resolved by the control plane
    ///
    /// # Example
    /// ```no_run
    /// # use sluice_client::ControlPlaneClient;
    /// # use sluice_core::dto::pipeline::CreatePipeline;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ControlPlaneClient::new("http://localhost:8080");
    /// let created = client.create_pipeline("vc-1", &CreatePipeline {
    ///     name: "orders".to_string(),
    ///     pipeline_type: "connect".to_string(),
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_pipeline(
        &self,
        virtual_cluster_id: &str,
        req: &CreatePipeline,
    ) -> Result<CreatedPipeline> {
        let response = self
            .request(Method::POST, &["v1", "virtual-clusters", virtual_cluster_id, "pipelines"])?
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a pipeline overview together with all of its configuration versions
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline ID
    pub async fn describe_pipeline(&self, pipeline_id: &PipelineId) -> Result<PipelineDescription> {
        let response = self
            .request(Method::GET, &["v1", "pipelines", pipeline_id.as_str()])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline ID to delete
    pub async fn delete_pipeline(&self, pipeline_id: &PipelineId) -> Result<()> {
        let response = self
            .request(Method::DELETE, &["v1", "pipelines", pipeline_id.as_str()])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Configuration Versions & Deployment
    // =============================================================================

    /// Create the next configuration version of a pipeline
    ///
    /// The control plane assigns the version number; versions are never modified afterwards.
    pub async fn create_configuration(
        &self,
        pipeline_id: &PipelineId,
        req: &CreateConfiguration,
    ) -> Result<CreatedConfiguration> {
        let response = self
            .request(Method::POST, &["v1", "pipelines", pipeline_id.as_str(), "configurations"])?
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Point the pipeline's deployment at a configuration version
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline ID
    /// * `req` - Configuration to deploy and its run state
    pub async fn set_deployment(&self, pipeline_id: &PipelineId, req: &SetDeployment) -> Result<()> {
        let response = self
            .request(Method::PUT, &["v1", "pipelines", pipeline_id.as_str(), "deployment"])?
            .json(req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
