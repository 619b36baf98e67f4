//! Desired pipeline state
//!
//! A declaration is decoded once at the boundary (YAML or JSON) and then
//! handed to the planner as a typed value.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::pipeline::RunState;
use crate::error::{Error, Result};
use crate::normalize::normalize;

/// Declared configuration version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredVersion {
    pub version: u32,
    /// Configuration document; may be written inline as a mapping or as a string
    #[serde(deserialize_with = "content_from_value")]
    pub content: String,
}

/// Desired state of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
    pub virtual_cluster_id: String,
    pub versions: Vec<DeclaredVersion>,
    pub deployed_version: u32,
    #[serde(default)]
    pub run_state: RunState,
}

impl PipelineDeclaration {
    /// Decode a declaration from YAML (JSON is accepted as well)
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Parse(format!("Invalid declaration: {}", e)))
    }

    /// Check the declaration on its own, without any observed state
    ///
    /// Rejects an empty version list, non-dense version indices, documents
    /// that do not normalize and an out-of-range deployed version.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("pipeline name cannot be empty"));
        }

        if self.virtual_cluster_id.trim().is_empty() {
            return Err(Error::validation("virtual_cluster_id cannot be empty"));
        }

        if self.versions.is_empty() {
            return Err(Error::validation(
                "at least one configuration version must be declared",
            ));
        }

        for (index, declared) in self.versions.iter().enumerate() {
            if declared.version as usize != index {
                return Err(Error::validation(format!(
                    "version index mismatch: expected version {}, got {}",
                    index, declared.version
                )));
            }

            if let Err(e) = normalize(&declared.content) {
                return Err(Error::validation(format!(
                    "content of version {} is not a valid document: {}",
                    declared.version, e
                )));
            }
        }

        if self.deployed_version as usize >= self.versions.len() {
            return Err(Error::validation(format!(
                "deployed_version {} does not exist ({} version(s) declared)",
                self.deployed_version,
                self.versions.len()
            )));
        }

        Ok(())
    }
}

fn content_from_value<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::String(text) => Ok(text),
        other => serde_yaml::to_string(&other).map_err(serde::de::Error::custom),
    }
}
