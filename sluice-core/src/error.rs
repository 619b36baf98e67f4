//! Error types for pipeline reconciliation

use thiserror::Error;

use crate::domain::pipeline::{ConfigId, Pipeline, PipelineId};

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while planning or applying a pipeline reconciliation
#[derive(Debug, Error)]
pub enum Error {
    /// The declaration is malformed; raised before any backend call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A configuration document could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration version that already exists was declared with different content
    #[error("Configuration version {version} is immutable and cannot be changed:\n{diff}")]
    ImmutableViolation {
        /// Index of the historical version
        version: u32,
        /// Line diff of the normalized stored and declared content
        diff: String,
    },

    /// A version index does not refer to an existing version
    #[error("Version index {index} out of range (pipeline has {len} version(s))")]
    Range {
        /// Requested index
        index: u32,
        /// Number of existing versions
        len: usize,
    },

    /// The backend described a pipeline that violates the version model
    #[error("Inconsistent pipeline description: {0}")]
    Inconsistent(String),

    /// The backend reported a deployed configuration that is not in its version list
    #[error(
        "Pipeline {pipeline_id} reports deployed configuration {config_id}, which is not among its versions"
    )]
    DeployedConfigMissing {
        pipeline_id: PipelineId,
        config_id: ConfigId,
    },

    /// A backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if retrying the same operation later may succeed
    ///
    /// A deployed configuration missing from the version list is treated as
    /// eventual-consistency lag on the backend side.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DeployedConfigMissing { .. } => true,
            Self::Backend(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Failure of a backend call
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The addressed resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The API answered with an error status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Api { status: 404, .. })
    }

    /// Check if this error may go away on retry (5xx, 429 and transport failures)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Failure of [`Planner::apply`](crate::planner::Planner::apply)
///
/// Actions are not rolled back. `partial` holds the state reached before the
/// failing action so the caller can persist it; a later pass only needs to
/// append what is still missing.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ApplyError {
    /// State after the last successful action, `None` if the pipeline was never created
    pub partial: Option<Pipeline>,
    /// Number of actions that completed
    pub completed: usize,
    #[source]
    pub source: Error,
}
