//! `Backend` implementation over HTTP

use async_trait::async_trait;
use sluice_core::backend::{Backend, BackendResult};
use sluice_core::domain::pipeline::{ConfigId, PipelineId, RunState};
use sluice_core::dto::pipeline::{
    CreateConfiguration, CreatePipeline, CreatedPipeline, PipelineDescription, SetDeployment,
};
use tracing::debug;

use crate::ControlPlaneClient;

#[async_trait]
impl Backend for ControlPlaneClient {
    async fn create_pipeline(
        &self,
        virtual_cluster_id: &str,
        name: &str,
        pipeline_type: &str,
    ) -> BackendResult<CreatedPipeline> {
        debug!("POST pipeline '{}' in virtual cluster {}", name, virtual_cluster_id);

        let req = CreatePipeline {
            name: name.to_string(),
            pipeline_type: pipeline_type.to_string(),
        };

        Ok(ControlPlaneClient::create_pipeline(self, virtual_cluster_id, &req).await?)
    }

    async fn create_configuration_version(
        &self,
        pipeline_id: &PipelineId,
        content: &str,
    ) -> BackendResult<ConfigId> {
        debug!("POST configuration for pipeline {}", pipeline_id);

        let req = CreateConfiguration {
            content: content.to_string(),
        };
        let created = self.create_configuration(pipeline_id, &req).await?;

        Ok(created.id)
    }

    async fn set_deployment(
        &self,
        pipeline_id: &PipelineId,
        config_id: &ConfigId,
        run_state: RunState,
    ) -> BackendResult<()> {
        debug!(
            "PUT deployment of pipeline {} -> {} ({})",
            pipeline_id, config_id, run_state
        );

        let req = SetDeployment {
            configuration_id: config_id.clone(),
            state: run_state,
        };

        Ok(ControlPlaneClient::set_deployment(self, pipeline_id, &req).await?)
    }

    async fn describe_pipeline(
        &self,
        pipeline_id: &PipelineId,
    ) -> BackendResult<PipelineDescription> {
        debug!("GET pipeline {}", pipeline_id);

        Ok(ControlPlaneClient::describe_pipeline(self, pipeline_id).await?)
    }

    async fn delete_pipeline(&self, pipeline_id: &PipelineId) -> BackendResult<()> {
        debug!("DELETE pipeline {}", pipeline_id);

        Ok(ControlPlaneClient::delete_pipeline(self, pipeline_id).await?)
    }
}
