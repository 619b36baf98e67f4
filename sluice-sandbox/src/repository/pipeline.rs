//! Pipeline Repository
//!
//! Handles all store operations related to pipelines, their configuration
//! versions and deployment pointer.

use sluice_core::domain::pipeline::{ConfigId, PipelineId, RunState};
use sluice_core::dto::pipeline::{
    ConfigurationRecord, CreatedConfiguration, PipelineDescription, PipelineOverview,
};
use uuid::Uuid;

use crate::store::{ConfigurationRow, DeploymentRow, PipelineRecord, Store};

/// Outcome of a deployment update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentUpdate {
    Updated,
    PipelineMissing,
    ConfigurationMissing,
}

/// Insert a new pipeline and return its ID
pub async fn create(
    store: &Store,
    virtual_cluster_id: &str,
    name: &str,
    pipeline_type: &str,
) -> PipelineId {
    let id = PipelineId::new(Uuid::new_v4().to_string());

    let record = PipelineRecord {
        id: id.clone(),
        name: name.to_string(),
        pipeline_type: pipeline_type.to_string(),
        virtual_cluster_id: virtual_cluster_id.to_string(),
        configurations: Vec::new(),
        deployment: None,
    };

    store.write().await.insert(id.clone(), record);

    id
}

/// Find a pipeline by ID, with all of its configuration versions
pub async fn find_by_id(store: &Store, id: &PipelineId) -> Option<PipelineDescription> {
    store.read().await.get(id).map(describe)
}

/// Append the next configuration version to a pipeline
///
/// Returns `None` if the pipeline does not exist.
pub async fn add_configuration(
    store: &Store,
    id: &PipelineId,
    content: &str,
) -> Option<CreatedConfiguration> {
    let mut pipelines = store.write().await;
    let record = pipelines.get_mut(id)?;

    let created = CreatedConfiguration {
        id: ConfigId::new(Uuid::new_v4().to_string()),
        version: record.configurations.len() as u32,
    };

    record.configurations.push(ConfigurationRow {
        id: created.id.clone(),
        version: created.version,
        content: content.to_string(),
    });

    Some(created)
}

/// Move the deployment pointer of a pipeline
pub async fn set_deployment(
    store: &Store,
    id: &PipelineId,
    configuration_id: &ConfigId,
    state: RunState,
) -> DeploymentUpdate {
    let mut pipelines = store.write().await;
    let Some(record) = pipelines.get_mut(id) else {
        return DeploymentUpdate::PipelineMissing;
    };

    if !record
        .configurations
        .iter()
        .any(|c| &c.id == configuration_id)
    {
        return DeploymentUpdate::ConfigurationMissing;
    }

    record.deployment = Some(DeploymentRow {
        configuration_id: configuration_id.clone(),
        state,
    });

    DeploymentUpdate::Updated
}

/// Delete a pipeline by ID
pub async fn delete(store: &Store, id: &PipelineId) -> bool {
    store.write().await.remove(id).is_some()
}

// =============================================================================
// Record Conversion
// =============================================================================

fn describe(record: &PipelineRecord) -> PipelineDescription {
    PipelineDescription {
        overview: PipelineOverview {
            id: record.id.clone(),
            name: record.name.clone(),
            pipeline_type: record.pipeline_type.clone(),
            virtual_cluster_id: record.virtual_cluster_id.clone(),
            state: record.deployment.as_ref().map(|d| d.state),
            deployed_configuration_id: record
                .deployment
                .as_ref()
                .map(|d| d.configuration_id.clone()),
        },
        configurations: record
            .configurations
            .iter()
            .map(|c| ConfigurationRecord {
                id: c.id.clone(),
                version: c.version,
                content: c.content.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_store;

    #[tokio::test]
    async fn test_configurations_numbered_densely() {
        let store = create_store();
        let id = create(&store, "vc-1", "orders", "connect").await;

        let first = add_configuration(&store, &id, "a: 1").await.unwrap();
        let second = add_configuration(&store, &id, "a: 2").await.unwrap();
        assert_eq!(first.version, 0);
        assert_eq!(second.version, 1);

        let description = find_by_id(&store, &id).await.unwrap();
        assert_eq!(description.configurations.len(), 2);
        assert!(description.overview.deployed_configuration_id.is_none());
    }

    #[tokio::test]
    async fn test_deployment_requires_known_configuration() {
        let store = create_store();
        let id = create(&store, "vc-1", "orders", "connect").await;
        let config = add_configuration(&store, &id, "a: 1").await.unwrap();

        assert_eq!(
            set_deployment(&store, &id, &ConfigId::from("other"), RunState::Running).await,
            DeploymentUpdate::ConfigurationMissing
        );
        assert_eq!(
            set_deployment(&store, &PipelineId::from("nope"), &config.id, RunState::Running).await,
            DeploymentUpdate::PipelineMissing
        );
        assert_eq!(
            set_deployment(&store, &id, &config.id, RunState::Paused).await,
            DeploymentUpdate::Updated
        );

        let overview = find_by_id(&store, &id).await.unwrap().overview;
        assert_eq!(overview.deployed_configuration_id, Some(config.id));
        assert_eq!(overview.state, Some(RunState::Paused));
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let store = create_store();
        let id = create(&store, "vc-1", "orders", "connect").await;

        assert!(delete(&store, &id).await);
        assert!(!delete(&store, &id).await);
        assert!(find_by_id(&store, &id).await.is_none());
    }
}
