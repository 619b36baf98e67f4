//! In-memory backend that records every call, for planner tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{Backend, BackendResult};
use crate::domain::pipeline::{ConfigId, PipelineId, RunState};
use crate::dto::pipeline::{
    ConfigurationRecord, CreatedPipeline, PipelineDescription, PipelineOverview,
};
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreatePipeline { name: String },
    CreateVersion { pipeline_id: PipelineId, content: String },
    SetDeployment { pipeline_id: PipelineId, config_id: ConfigId, run_state: RunState },
    Describe { pipeline_id: PipelineId },
    Delete { pipeline_id: PipelineId },
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::Describe { .. })
    }
}

#[derive(Debug, Clone)]
struct StoredPipeline {
    name: String,
    pipeline_type: String,
    virtual_cluster_id: String,
    configurations: Vec<ConfigurationRecord>,
    deployed: Option<(ConfigId, RunState)>,
}

#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    pipelines: Mutex<HashMap<PipelineId, StoredPipeline>>,
    next_id: Mutex<u32>,
    version_creations_before_failure: Mutex<Option<usize>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Let `n` more version creations succeed, then fail every following one
    pub fn fail_version_creation_after(&self, n: usize) {
        *self.version_creations_before_failure.lock().unwrap() = Some(n);
    }

    pub fn heal(&self) {
        *self.version_creations_before_failure.lock().unwrap() = None;
    }

    /// Overwrite the reported deployed configuration without validation
    pub fn force_deployed(&self, pipeline_id: &PipelineId, config_id: ConfigId) {
        let mut pipelines = self.pipelines.lock().unwrap();
        let stored = pipelines.get_mut(pipeline_id).unwrap();
        stored.deployed = Some((config_id, RunState::Running));
    }

    /// Overwrite the version number reported for the configuration at `position`
    pub fn renumber_configuration(&self, pipeline_id: &PipelineId, position: usize, version: u32) {
        let mut pipelines = self.pipelines.lock().unwrap();
        let stored = pipelines.get_mut(pipeline_id).unwrap();
        stored.configurations[position].version = version;
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}-{}", prefix, *next)
    }

    fn not_found(pipeline_id: &PipelineId) -> BackendError {
        BackendError::NotFound(format!("pipeline {}", pipeline_id))
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn create_pipeline(
        &self,
        virtual_cluster_id: &str,
        name: &str,
        pipeline_type: &str,
    ) -> BackendResult<CreatedPipeline> {
        self.record(Call::CreatePipeline {
            name: name.to_string(),
        });

        let id = PipelineId::new(self.next_id("pipe"));
        let resolved = pipeline_type.to_lowercase();
        self.pipelines.lock().unwrap().insert(
            id.clone(),
            StoredPipeline {
                name: name.to_string(),
                pipeline_type: resolved.clone(),
                virtual_cluster_id: virtual_cluster_id.to_string(),
                configurations: Vec::new(),
                deployed: None,
            },
        );

        Ok(CreatedPipeline {
            id,
            pipeline_type: resolved,
        })
    }

    async fn create_configuration_version(
        &self,
        pipeline_id: &PipelineId,
        content: &str,
    ) -> BackendResult<ConfigId> {
        self.record(Call::CreateVersion {
            pipeline_id: pipeline_id.clone(),
            content: content.to_string(),
        });

        {
            let mut budget = self.version_creations_before_failure.lock().unwrap();
            match budget.as_mut() {
                Some(0) => {
                    return Err(BackendError::Api {
                        status: 503,
                        message: "configuration service unavailable".to_string(),
                    });
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }

        let config_id = ConfigId::new(self.next_id("cfg"));
        let mut pipelines = self.pipelines.lock().unwrap();
        let stored = pipelines
            .get_mut(pipeline_id)
            .ok_or_else(|| Self::not_found(pipeline_id))?;
        let version = stored.configurations.len() as u32;
        stored.configurations.push(ConfigurationRecord {
            id: config_id.clone(),
            version,
            content: content.to_string(),
        });

        Ok(config_id)
    }

    async fn set_deployment(
        &self,
        pipeline_id: &PipelineId,
        config_id: &ConfigId,
        run_state: RunState,
    ) -> BackendResult<()> {
        self.record(Call::SetDeployment {
            pipeline_id: pipeline_id.clone(),
            config_id: config_id.clone(),
            run_state,
        });

        let mut pipelines = self.pipelines.lock().unwrap();
        let stored = pipelines
            .get_mut(pipeline_id)
            .ok_or_else(|| Self::not_found(pipeline_id))?;
        stored.deployed = Some((config_id.clone(), run_state));
        Ok(())
    }

    async fn describe_pipeline(
        &self,
        pipeline_id: &PipelineId,
    ) -> BackendResult<PipelineDescription> {
        self.record(Call::Describe {
            pipeline_id: pipeline_id.clone(),
        });

        let pipelines = self.pipelines.lock().unwrap();
        let stored = pipelines
            .get(pipeline_id)
            .ok_or_else(|| Self::not_found(pipeline_id))?;

        // Reverse order so callers cannot rely on the backend sorting versions
        let mut configurations = stored.configurations.clone();
        configurations.reverse();

        Ok(PipelineDescription {
            overview: PipelineOverview {
                id: pipeline_id.clone(),
                name: stored.name.clone(),
                pipeline_type: stored.pipeline_type.clone(),
                virtual_cluster_id: stored.virtual_cluster_id.clone(),
                state: stored.deployed.as_ref().map(|(_, state)| *state),
                deployed_configuration_id: stored.deployed.as_ref().map(|(id, _)| id.clone()),
            },
            configurations,
        })
    }

    async fn delete_pipeline(&self, pipeline_id: &PipelineId) -> BackendResult<()> {
        self.record(Call::Delete {
            pipeline_id: pipeline_id.clone(),
        });

        self.pipelines
            .lock()
            .unwrap()
            .remove(pipeline_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(pipeline_id))
    }
}
