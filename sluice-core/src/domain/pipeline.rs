//! Pipeline domain types
//!
//! A pipeline owns an append-only sequence of configuration versions and a
//! deployment pointer selecting the live version and its run state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::normalize::{diff_normalized, normalize};

/// Backend-assigned pipeline identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(String);

impl PipelineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PipelineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Backend-assigned configuration version identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(String);

impl ConfigId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConfigId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Run state of the deployed configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Paused => write!(f, "paused"),
        }
    }
}

/// One immutable configuration snapshot of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationVersion {
    /// Dense, zero-based index within the pipeline
    pub version: u32,
    /// Configuration document as declared
    pub content: String,
    /// Identifier assigned by the backend on creation
    pub remote_id: Option<ConfigId>,
}

/// The live configuration selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPointer {
    pub version_index: u32,
    pub run_state: RunState,
}

/// Observed state of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Option<PipelineId>,
    pub name: String,
    pub pipeline_type: String,
    /// Type as canonicalized by the backend
    pub resolved_type: Option<String>,
    pub virtual_cluster_id: String,
    pub versions: Vec<ConfigurationVersion>,
    pub deployed: Option<DeploymentPointer>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Create an empty, not yet created pipeline
    pub fn new(
        virtual_cluster_id: impl Into<String>,
        name: impl Into<String>,
        pipeline_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            pipeline_type: pipeline_type.into(),
            resolved_type: None,
            virtual_cluster_id: virtual_cluster_id.into(),
            versions: Vec::new(),
            deployed: None,
            refreshed_at: None,
        }
    }

    /// Check whether `declared` names this pipeline's type, either as declared or as resolved
    pub fn matches_type(&self, declared: &str) -> bool {
        self.pipeline_type == declared || self.resolved_type.as_deref() == Some(declared)
    }

    // =============================================================================
    // Versioned Configuration Store
    // =============================================================================

    /// Number of versions that exist
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Append the next configuration version
    ///
    /// Only the next dense index (`version == version_count()`) may be appended.
    pub fn append(
        &mut self,
        version: u32,
        content: impl Into<String>,
        remote_id: Option<ConfigId>,
    ) -> Result<u32> {
        let expected = self.versions.len();
        if version as usize != expected {
            return Err(Error::validation(format!(
                "version index mismatch: expected version {}, got {}",
                expected, version
            )));
        }

        self.versions.push(ConfigurationVersion {
            version,
            content: content.into(),
            remote_id,
        });

        Ok(version)
    }

    /// Look up a version by index
    pub fn get(&self, version: u32) -> Result<&ConfigurationVersion> {
        self.versions.get(version as usize).ok_or(Error::Range {
            index: version,
            len: self.versions.len(),
        })
    }

    /// Fail if `new_content` is not semantically equal to the stored version
    pub fn verify_unchanged(&self, version: u32, new_content: &str) -> Result<()> {
        let stored = self.get(version)?;
        let stored_normalized = normalize(&stored.content)?;
        let new_normalized = normalize(new_content)?;

        if stored_normalized != new_normalized {
            return Err(Error::ImmutableViolation {
                version,
                diff: diff_normalized(&stored_normalized, &new_normalized),
            });
        }

        Ok(())
    }

    // =============================================================================
    // Deployment Pointer
    // =============================================================================

    /// Check whether moving the pointer to this pair would change it
    pub fn would_change(&self, version_index: u32, run_state: RunState) -> bool {
        self.deployed
            != Some(DeploymentPointer {
                version_index,
                run_state,
            })
    }

    /// Move the deployment pointer
    ///
    /// Returns `false` and leaves the pointer untouched when the pair is
    /// already the recorded one.
    pub fn move_to(&mut self, version_index: u32, run_state: RunState) -> Result<bool> {
        self.get(version_index)?;

        if !self.would_change(version_index, run_state) {
            return Ok(false);
        }

        self.deployed = Some(DeploymentPointer {
            version_index,
            run_state,
        });

        Ok(true)
    }

    /// The configuration version the pointer currently selects
    pub fn deployed_version(&self) -> Option<&ConfigurationVersion> {
        self.deployed
            .and_then(|pointer| self.versions.get(pointer.version_index as usize))
    }

    /// Check the structural invariants of the version list and pointer
    pub fn check_invariants(&self) -> Result<()> {
        for (index, version) in self.versions.iter().enumerate() {
            if version.version as usize != index {
                return Err(Error::Inconsistent(format!(
                    "version at position {} has index {}",
                    index, version.version
                )));
            }
        }

        if let Some(pointer) = self.deployed {
            self.get(pointer.version_index)?;
        }

        Ok(())
    }
}
