//! Pipeline DTOs for the control-plane API

use serde::{Deserialize, Serialize};

use crate::domain::pipeline::{ConfigId, PipelineId, RunState};

/// Request to create a new pipeline inside a virtual cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipeline {
    pub name: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
}

/// Response to a pipeline creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedPipeline {
    pub id: PipelineId,
    /// Type as canonicalized by the control plane
    #[serde(rename = "type")]
    pub pipeline_type: String,
}

/// Request to create the next configuration version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfiguration {
    pub content: String,
}

/// Response to a configuration creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedConfiguration {
    pub id: ConfigId,
    pub version: u32,
}

/// Request to move the deployment pointer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDeployment {
    pub configuration_id: ConfigId,
    pub state: RunState,
}

/// Pipeline overview as reported by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOverview {
    pub id: PipelineId,
    pub name: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
    pub virtual_cluster_id: String,
    pub state: Option<RunState>,
    pub deployed_configuration_id: Option<ConfigId>,
}

/// One configuration version as reported by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub id: ConfigId,
    pub version: u32,
    pub content: String,
}

/// Full description of a pipeline: overview plus every configuration version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDescription {
    pub overview: PipelineOverview,
    pub configurations: Vec<ConfigurationRecord>,
}

/// Error body returned by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
