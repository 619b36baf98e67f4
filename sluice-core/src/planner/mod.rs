//! Reconciliation Planner
//!
//! Drives a pipeline through its lifecycle:
//! `Absent -> Created -> Populated(n) -> Populated(n+1) -> ...`, with the
//! deployment pointer as an overlay on any populated state and `Deleted`
//! reachable from anywhere.
//!
//! - [`Planner::plan`] validates a declaration against observed state and
//!   computes the ordered actions. It never calls the backend.
//! - [`Planner::apply`] executes those actions one by one.
//! - [`Planner::read`] rebuilds observed state from the backend.
//! - [`Planner::delete`] removes the pipeline; deleting twice is fine.

mod plan;

pub use plan::{Action, Plan, plan};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::domain::declaration::PipelineDeclaration;
use crate::domain::pipeline::{Pipeline, PipelineId, RunState};
use crate::dto::pipeline::PipelineDescription;
use crate::error::{ApplyError, Error, Result};
use crate::normalize::semantically_equal;

/// Reconciles pipeline declarations through an injected backend
pub struct Planner<B> {
    backend: B,
}

impl<B: Backend> Planner<B> {
    /// Creates a planner that issues all calls through `backend`
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Computes the actions needed to reach `desired`; see [`plan()`]
    pub fn plan(&self, desired: &PipelineDeclaration, observed: Option<&Pipeline>) -> Result<Plan> {
        plan(desired, observed)
    }

    /// Executes a plan in order
    ///
    /// Stops at the first failing action. Nothing is rolled back: the error
    /// carries the state reached so far.
    pub async fn apply(&self, plan: Plan) -> std::result::Result<Pipeline, ApplyError> {
        let name = plan.name().to_string();
        let (mut current, actions) = plan.into_parts();

        if actions.is_empty() {
            debug!("Pipeline '{}' is up to date, nothing to apply", name);
        }

        for (completed, action) in actions.iter().enumerate() {
            if let Err(source) = self.execute(&mut current, action).await {
                warn!(
                    "Applying '{}' to pipeline '{}' failed after {} action(s): {}",
                    action, name, completed, source
                );
                return Err(ApplyError {
                    partial: current,
                    completed,
                    source,
                });
            }
        }

        let mut pipeline = current.ok_or_else(|| ApplyError {
            partial: None,
            completed: actions.len(),
            source: Error::validation(format!(
                "plan for '{}' neither creates nor references a pipeline",
                name
            )),
        })?;
        pipeline.refreshed_at = Some(Utc::now());

        Ok(pipeline)
    }

    /// Plans and applies in one step
    pub async fn reconcile(
        &self,
        desired: &PipelineDeclaration,
        observed: Option<&Pipeline>,
    ) -> std::result::Result<Pipeline, ApplyError> {
        let plan = self.plan(desired, observed).map_err(|source| ApplyError {
            partial: observed.cloned(),
            completed: 0,
            source,
        })?;

        self.apply(plan).await
    }

    async fn execute(&self, current: &mut Option<Pipeline>, action: &Action) -> Result<()> {
        match action {
            Action::CreatePipeline {
                virtual_cluster_id,
                name,
                pipeline_type,
            } => {
                if current.is_some() {
                    return Err(Error::validation(format!(
                        "pipeline '{}' already exists",
                        name
                    )));
                }

                let created = self
                    .backend
                    .create_pipeline(virtual_cluster_id, name, pipeline_type)
                    .await?;

                info!("Pipeline created: {} ({})", name, created.id);

                let mut pipeline = Pipeline::new(
                    virtual_cluster_id.as_str(),
                    name.as_str(),
                    pipeline_type.as_str(),
                );
                pipeline.id = Some(created.id);
                pipeline.resolved_type = Some(created.pipeline_type);
                *current = Some(pipeline);
            }
            Action::CreateVersion { version, content } => {
                let pipeline = require_created(current)?;
                let pipeline_id = require_id(pipeline)?;

                if *version as usize != pipeline.version_count() {
                    return Err(Error::validation(format!(
                        "version index mismatch: expected version {}, got {}",
                        pipeline.version_count(),
                        version
                    )));
                }

                let config_id = self
                    .backend
                    .create_configuration_version(&pipeline_id, content)
                    .await?;

                info!(
                    "Configuration version {} created for pipeline {} ({})",
                    version, pipeline_id, config_id
                );

                pipeline.append(*version, content.as_str(), Some(config_id))?;
            }
            Action::SetDeployment {
                version_index,
                run_state,
            } => {
                let pipeline = require_created(current)?;
                let pipeline_id = require_id(pipeline)?;

                if !pipeline.would_change(*version_index, *run_state) {
                    debug!(
                        "Pipeline {} already deploys version {} ({})",
                        pipeline_id, version_index, run_state
                    );
                    return Ok(());
                }

                let config_id = pipeline.get(*version_index)?.remote_id.clone().ok_or_else(|| {
                    Error::Inconsistent(format!(
                        "version {} of pipeline {} has no configuration id",
                        version_index, pipeline_id
                    ))
                })?;

                self.backend
                    .set_deployment(&pipeline_id, &config_id, *run_state)
                    .await?;

                pipeline.move_to(*version_index, *run_state)?;

                info!(
                    "Pipeline {} now deploys version {} ({})",
                    pipeline_id, version_index, run_state
                );
            }
        }

        Ok(())
    }

    /// Rebuilds observed state from the backend
    ///
    /// With a `prior` state, the declared type and the declared text of
    /// semantically unchanged versions are kept, so a read right after an
    /// apply yields the same state.
    ///
    /// # Errors
    /// - `Inconsistent` if the reported versions are not dense
    /// - `DeployedConfigMissing` if the deployed configuration is not among
    ///   the reported versions
    pub async fn read(&self, pipeline_id: &PipelineId, prior: Option<&Pipeline>) -> Result<Pipeline> {
        let description = self.backend.describe_pipeline(pipeline_id).await?;
        let pipeline = rebuild(pipeline_id, description, prior)?;

        debug!(
            "Read pipeline {}: {} version(s), deployed {:?}",
            pipeline_id,
            pipeline.version_count(),
            pipeline.deployed
        );

        Ok(pipeline)
    }

    /// Deletes a pipeline; a pipeline that no longer exists counts as deleted
    pub async fn delete(&self, pipeline_id: &PipelineId) -> Result<()> {
        match self.backend.delete_pipeline(pipeline_id).await {
            Ok(()) => {
                info!("Pipeline deleted: {}", pipeline_id);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!("Pipeline {} already absent, nothing to delete", pipeline_id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn require_created(current: &mut Option<Pipeline>) -> Result<&mut Pipeline> {
    current
        .as_mut()
        .ok_or_else(|| Error::validation("pipeline has not been created"))
}

fn require_id(pipeline: &Pipeline) -> Result<PipelineId> {
    pipeline
        .id
        .clone()
        .ok_or_else(|| Error::validation(format!("pipeline '{}' has no id", pipeline.name)))
}

fn rebuild(
    pipeline_id: &PipelineId,
    description: PipelineDescription,
    prior: Option<&Pipeline>,
) -> Result<Pipeline> {
    let PipelineDescription {
        overview,
        mut configurations,
    } = description;

    let declared_type = prior
        .filter(|prior| prior.matches_type(&overview.pipeline_type))
        .map(|prior| prior.pipeline_type.clone())
        .unwrap_or_else(|| overview.pipeline_type.clone());

    let mut pipeline = Pipeline::new(overview.virtual_cluster_id, overview.name, declared_type);
    pipeline.id = Some(overview.id);
    pipeline.resolved_type = Some(overview.pipeline_type);

    configurations.sort_by_key(|record| record.version);
    for record in configurations {
        let content = match prior.and_then(|p| p.versions.get(record.version as usize)) {
            Some(known) if semantically_equal(&known.content, &record.content).unwrap_or(false) => {
                known.content.clone()
            }
            _ => record.content,
        };

        pipeline
            .append(record.version, content, Some(record.id))
            .map_err(|_| {
                Error::Inconsistent(format!(
                    "pipeline {} reported non-contiguous configuration versions",
                    pipeline_id
                ))
            })?;
    }

    if let Some(config_id) = overview.deployed_configuration_id {
        let version_index = pipeline
            .versions
            .iter()
            .find(|v| v.remote_id.as_ref() == Some(&config_id))
            .map(|v| v.version)
            .ok_or_else(|| Error::DeployedConfigMissing {
                pipeline_id: pipeline_id.clone(),
                config_id: config_id.clone(),
            })?;

        pipeline.move_to(version_index, overview.state.unwrap_or(RunState::Running))?;
    }

    pipeline.refreshed_at = Some(Utc::now());
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::declaration::DeclaredVersion;
    use crate::domain::pipeline::{ConfigId, DeploymentPointer};
    use crate::testing::{Call, RecordingBackend};

    fn declaration(contents: &[&str], deployed_version: u32, run_state: RunState) -> PipelineDeclaration {
        PipelineDeclaration {
            name: "orders".to_string(),
            pipeline_type: "Connect".to_string(),
            virtual_cluster_id: "vc-1".to_string(),
            versions: contents
                .iter()
                .enumerate()
                .map(|(i, content)| DeclaredVersion {
                    version: i as u32,
                    content: content.to_string(),
                })
                .collect(),
            deployed_version,
            run_state,
        }
    }

    fn planner() -> (Planner<Arc<RecordingBackend>>, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::new());
        (Planner::new(backend.clone()), backend)
    }

    const V0: &str = "input:\n  topic: orders\n  group: g1\noutput:\n  topic: audit\n";
    const V0_REFORMATTED: &str = "output: {topic: audit}\ninput: {group: g1, topic: orders}\n";
    const V1: &str = "input:\n  topic: orders\n  group: g2\noutput:\n  topic: audit\n";

    /// Scenario A: one version, deployed and running
    async fn scenario_a(planner: &Planner<Arc<RecordingBackend>>) -> Pipeline {
        planner
            .reconcile(&declaration(&[V0], 0, RunState::Running), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_single_version() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Call::CreatePipeline { .. }));
        assert!(matches!(calls[1], Call::CreateVersion { .. }));
        assert!(matches!(
            calls[2],
            Call::SetDeployment {
                run_state: RunState::Running,
                ..
            }
        ));

        assert_eq!(state.version_count(), 1);
        assert_eq!(
            state.deployed,
            Some(DeploymentPointer {
                version_index: 0,
                run_state: RunState::Running
            })
        );
        assert_eq!(state.pipeline_type, "Connect");
        assert_eq!(state.resolved_type.as_deref(), Some("connect"));
        assert!(state.check_invariants().is_ok());
    }

    #[tokio::test]
    async fn test_append_version_and_move_pointer() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;
        let v0_id = state.versions[0].remote_id.clone().unwrap();
        backend.clear_calls();

        let desired = declaration(&[V0_REFORMATTED, V1], 1, RunState::Running);
        let state = planner.reconcile(&desired, Some(&state)).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::CreateVersion { content, .. } if content == V1));
        let v1_id = state.versions[1].remote_id.clone().unwrap();
        assert!(matches!(&calls[1], Call::SetDeployment { config_id, .. } if *config_id == v1_id));
        assert!(calls.iter().all(|call| !matches!(
            call,
            Call::SetDeployment { config_id, .. } if *config_id == v0_id
        )));

        assert_eq!(state.version_count(), 2);
        assert_eq!(state.deployed.unwrap().version_index, 1);
        // Stored history keeps the originally declared text
        assert_eq!(state.versions[0].content, V0);
    }

    #[tokio::test]
    async fn test_changed_history_rejected_without_calls() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;
        backend.clear_calls();

        let desired = declaration(&[V1], 0, RunState::Running);
        let err = planner.reconcile(&desired, Some(&state)).await.unwrap_err();

        assert!(matches!(err.source, Error::ImmutableViolation { version: 0, .. }));
        assert_eq!(err.completed, 0);
        assert_eq!(err.partial.as_ref(), Some(&state));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_dense_versions_rejected_before_any_call() {
        let (planner, backend) = planner();
        let mut desired = declaration(&[V0, V1], 0, RunState::Running);
        desired.versions[1].version = 2;

        let err = planner.reconcile(&desired, None).await.unwrap_err();

        assert!(matches!(err.source, Error::Validation(msg) if msg.contains("mismatch")));
        assert!(err.partial.is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pause_only_moves_pointer() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;
        backend.clear_calls();

        let desired = declaration(&[V0], 0, RunState::Paused);
        let state = planner.reconcile(&desired, Some(&state)).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            calls[0],
            Call::SetDeployment {
                run_state: RunState::Paused,
                ..
            }
        ));
        assert_eq!(state.deployed.unwrap().run_state, RunState::Paused);
    }

    #[tokio::test]
    async fn test_second_apply_is_noop() {
        let (planner, backend) = planner();
        let desired = declaration(&[V0, V1], 1, RunState::Paused);
        let first = planner.reconcile(&desired, None).await.unwrap();
        backend.clear_calls();

        let plan = planner.plan(&desired, Some(&first)).unwrap();
        assert!(plan.is_noop());
        let second = planner.apply(plan).await.unwrap();

        assert!(backend.mutations().is_empty());
        assert_eq!(second.versions, first.versions);
        assert_eq!(second.deployed, first.deployed);
    }

    #[tokio::test]
    async fn test_read_matches_applied_state() {
        let (planner, _backend) = planner();
        let desired = declaration(&[V0, V1], 0, RunState::Paused);
        let applied = planner.reconcile(&desired, None).await.unwrap();
        let id = applied.id.clone().unwrap();

        let read = planner.read(&id, Some(&applied)).await.unwrap();
        assert_eq!(read.versions, applied.versions);
        assert_eq!(read.deployed, applied.deployed);
        assert_eq!(read.pipeline_type, "Connect");

        // Without prior state the backend's view is taken as-is
        let imported = planner.read(&id, None).await.unwrap();
        assert_eq!(imported.pipeline_type, "connect");
        assert_eq!(imported.deployed, applied.deployed);

        let mut canonical = desired.clone();
        canonical.pipeline_type = "connect".to_string();
        assert!(planner.plan(&canonical, Some(&imported)).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_read_unknown_deployed_config() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;
        let id = state.id.clone().unwrap();
        backend.force_deployed(&id, ConfigId::from("cfg-unknown"));

        let err = planner.read(&id, Some(&state)).await.unwrap_err();
        assert!(matches!(err, Error::DeployedConfigMissing { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_read_rejects_non_dense_versions() {
        let (planner, backend) = planner();
        let state = planner
            .reconcile(&declaration(&[V0, V1], 0, RunState::Running), None)
            .await
            .unwrap();
        let id = state.id.clone().unwrap();
        backend.renumber_configuration(&id, 1, 2);

        let err = planner.read(&id, Some(&state)).await.unwrap_err();
        assert!(matches!(err, Error::Inconsistent(msg) if msg.contains("non-contiguous")));
    }

    #[tokio::test]
    async fn test_apply_skips_pointer_move_already_in_place() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;
        backend.clear_calls();

        let plan = Plan::new(
            "orders",
            Some(state.clone()),
            vec![Action::SetDeployment {
                version_index: 0,
                run_state: RunState::Running,
            }],
        );
        let applied = planner.apply(plan).await.unwrap();

        assert!(backend.calls().is_empty());
        assert_eq!(applied.deployed, state.deployed);
    }

    #[tokio::test]
    async fn test_partial_failure_then_retry_converges() {
        let (planner, backend) = planner();
        backend.fail_version_creation_after(1);

        let desired = declaration(&[V0, V1], 1, RunState::Running);
        let err = planner.reconcile(&desired, None).await.unwrap_err();

        assert!(matches!(err.source, Error::Backend(_)));
        assert!(err.source.is_transient());
        // pipeline + version 0 succeeded; version 1 failed before the pointer move
        assert_eq!(err.completed, 2);
        let partial = err.partial.unwrap();
        assert_eq!(partial.version_count(), 1);
        assert!(partial.deployed.is_none());

        backend.heal();
        backend.clear_calls();

        let observed = planner.read(partial.id.as_ref().unwrap(), Some(&partial)).await.unwrap();
        let state = planner.reconcile(&desired, Some(&observed)).await.unwrap();

        let mutations = backend.mutations();
        assert_eq!(mutations.len(), 2);
        assert!(matches!(&mutations[0], Call::CreateVersion { content, .. } if content == V1));
        assert!(matches!(mutations[1], Call::SetDeployment { .. }));
        assert_eq!(state.version_count(), 2);
        assert_eq!(state.deployed.unwrap().version_index, 1);
        assert!(state.check_invariants().is_ok());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (planner, backend) = planner();
        let state = scenario_a(&planner).await;
        let id = state.id.unwrap();

        planner.delete(&id).await.unwrap();
        planner.delete(&id).await.unwrap();

        let deletes = backend
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Delete { .. }))
            .count();
        assert_eq!(deletes, 2);
        assert!(matches!(
            planner.read(&id, None).await,
            Err(Error::Backend(err)) if err.is_not_found()
        ));
    }

    #[tokio::test]
    async fn test_pointer_stays_in_range_across_passes() {
        let (planner, _backend) = planner();
        let mut observed: Option<Pipeline> = None;
        let passes = [
            declaration(&[V0], 0, RunState::Running),
            declaration(&[V0, V1], 0, RunState::Paused),
            declaration(&[V0, V1, "threads: 4"], 2, RunState::Running),
            declaration(&[V0, V1, "threads: 4"], 1, RunState::Running),
        ];

        for desired in &passes {
            let state = planner.reconcile(desired, observed.as_ref()).await.unwrap();
            let pointer = state.deployed.unwrap();
            assert!((pointer.version_index as usize) < state.version_count());
            assert!(state.check_invariants().is_ok());
            observed = Some(state);
        }
    }
}
