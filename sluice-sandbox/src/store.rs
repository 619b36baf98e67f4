//! In-memory store
//!
//! Holds every pipeline the sandbox knows about. The store is shared between
//! request handlers the way a connection pool would be.

use std::collections::HashMap;
use std::sync::Arc;

use sluice_core::domain::pipeline::{ConfigId, PipelineId, RunState};
use tokio::sync::RwLock;

/// Shared handle to the sandbox state
pub type Store = Arc<RwLock<HashMap<PipelineId, PipelineRecord>>>;

/// Create an empty store
pub fn create_store() -> Store {
    Arc::new(RwLock::new(HashMap::new()))
}

/// A stored pipeline
#[derive(Debug, Clone)]
pub struct PipelineRecord {
    pub id: PipelineId,
    pub name: String,
    pub pipeline_type: String,
    pub virtual_cluster_id: String,
    pub configurations: Vec<ConfigurationRow>,
    pub deployment: Option<DeploymentRow>,
}

/// A stored configuration version
#[derive(Debug, Clone)]
pub struct ConfigurationRow {
    pub id: ConfigId,
    pub version: u32,
    pub content: String,
}

/// The stored deployment pointer
#[derive(Debug, Clone)]
pub struct DeploymentRow {
    pub configuration_id: ConfigId,
    pub state: RunState,
}
