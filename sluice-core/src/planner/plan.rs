//! Reconciliation plans
//!
//! A plan is the ordered list of backend actions that moves observed state to
//! the declared state. Computing a plan never talks to the backend, so every
//! validation and immutability failure surfaces before anything is mutated.

use crate::domain::declaration::PipelineDeclaration;
use crate::domain::pipeline::{Pipeline, RunState};
use crate::error::{Error, Result};

/// A single backend mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreatePipeline {
        virtual_cluster_id: String,
        name: String,
        pipeline_type: String,
    },
    CreateVersion {
        version: u32,
        content: String,
    },
    SetDeployment {
        version_index: u32,
        run_state: RunState,
    },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::CreatePipeline {
                virtual_cluster_id,
                name,
                pipeline_type,
            } => write!(
                f,
                "create pipeline '{}' (type {}) in virtual cluster {}",
                name, pipeline_type, virtual_cluster_id
            ),
            Action::CreateVersion { version, .. } => {
                write!(f, "create configuration version {}", version)
            }
            Action::SetDeployment {
                version_index,
                run_state,
            } => write!(f, "deploy version {} ({})", version_index, run_state),
        }
    }
}

/// Ordered actions plus the observed state they start from
#[derive(Debug, Clone)]
pub struct Plan {
    name: String,
    observed: Option<Pipeline>,
    actions: Vec<Action>,
}

impl Plan {
    pub(crate) fn new(name: impl Into<String>, observed: Option<Pipeline>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            observed,
            actions,
        }
    }

    /// Pipeline name the plan applies to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observed state the plan was computed against
    pub fn observed(&self) -> Option<&Pipeline> {
        self.observed.as_ref()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// True when the declaration already matches the observed state
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Option<Pipeline>, Vec<Action>) {
        (self.observed, self.actions)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_noop() {
            return write!(f, "Pipeline '{}' is up to date", self.name);
        }

        writeln!(
            f,
            "Plan for pipeline '{}': {} action(s)",
            self.name,
            self.actions.len()
        )?;
        for (i, action) in self.actions.iter().enumerate() {
            write!(f, "  {}. {}", i + 1, action)?;
            if i + 1 < self.actions.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Compute the actions that bring `observed` to `desired`
///
/// # Errors
/// - `Validation` for a malformed declaration, a changed immutable attribute
///   or fewer declared versions than observed
/// - `ImmutableViolation` when an existing version's content changed
/// - `Inconsistent` / `Range` when `observed` breaks the version model
pub fn plan(desired: &PipelineDeclaration, observed: Option<&Pipeline>) -> Result<Plan> {
    desired.validate()?;

    let actions = match observed {
        None => plan_create(desired),
        Some(observed) => plan_update(desired, observed)?,
    };

    Ok(Plan::new(desired.name.as_str(), observed.cloned(), actions))
}

fn plan_create(desired: &PipelineDeclaration) -> Vec<Action> {
    let mut actions = Vec::with_capacity(desired.versions.len() + 2);
    actions.push(Action::CreatePipeline {
        virtual_cluster_id: desired.virtual_cluster_id.clone(),
        name: desired.name.clone(),
        pipeline_type: desired.pipeline_type.clone(),
    });

    for declared in &desired.versions {
        actions.push(Action::CreateVersion {
            version: declared.version,
            content: declared.content.clone(),
        });

        if declared.version == desired.deployed_version {
            actions.push(Action::SetDeployment {
                version_index: declared.version,
                run_state: desired.run_state,
            });
        }
    }

    actions
}

fn plan_update(desired: &PipelineDeclaration, observed: &Pipeline) -> Result<Vec<Action>> {
    if observed.id.is_none() {
        return Err(Error::validation(format!(
            "observed state for pipeline '{}' has no pipeline id",
            observed.name
        )));
    }

    observed.check_invariants()?;

    check_immutable_attribute("name", &observed.name, &desired.name)?;
    check_immutable_attribute(
        "virtual_cluster_id",
        &observed.virtual_cluster_id,
        &desired.virtual_cluster_id,
    )?;
    if !observed.matches_type(&desired.pipeline_type) {
        return Err(Error::validation(format!(
            "type cannot be changed after creation (observed '{}', declared '{}')",
            observed.pipeline_type, desired.pipeline_type
        )));
    }

    if desired.versions.len() < observed.version_count() {
        return Err(Error::validation(format!(
            "configuration versions are append-only: {} version(s) exist but only {} declared",
            observed.version_count(),
            desired.versions.len()
        )));
    }

    for (existing, declared) in observed.versions.iter().zip(&desired.versions) {
        observed.verify_unchanged(existing.version, &declared.content)?;
    }

    let mut actions: Vec<Action> = desired.versions[observed.version_count()..]
        .iter()
        .map(|declared| Action::CreateVersion {
            version: declared.version,
            content: declared.content.clone(),
        })
        .collect();

    if observed.would_change(desired.deployed_version, desired.run_state) {
        actions.push(Action::SetDeployment {
            version_index: desired.deployed_version,
            run_state: desired.run_state,
        });
    }

    Ok(actions)
}

fn check_immutable_attribute(field: &str, observed: &str, declared: &str) -> Result<()> {
    if observed != declared {
        return Err(Error::validation(format!(
            "{} cannot be changed after creation (observed '{}', declared '{}')",
            field, observed, declared
        )));
    }
    Ok(())
}
