//! Sluice HTTP Client
//!
//! A simple, type-safe HTTP client for the streaming-platform control-plane
//! API. It implements [`sluice_core::Backend`], so it can be handed straight to
//! a [`sluice_core::Planner`].
//!
//! # Example
//!
//! ```no_run
//! use sluice_client::ControlPlaneClient;
//! use sluice_core::Planner;
//! use sluice_core::domain::declaration::PipelineDeclaration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ControlPlaneClient::new("http://localhost:8080");
//!     let planner = Planner::new(client);
//!
//!     let desired = PipelineDeclaration::from_yaml(&std::fs::read_to_string("pipeline.yaml")?)?;
//!     let state = planner.reconcile(&desired, None).await?;
//!
//!     println!("Created pipeline: {:?}", state.id);
//!     Ok(())
//! }
//! ```

mod backend;
pub mod error;
mod pipelines;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use sluice_core::dto::pipeline::ErrorBody;

/// HTTP client for the control-plane API
///
/// Covers the pipeline endpoints the reconciler needs:
/// - Pipeline creation, description and deletion
/// - Configuration version creation
/// - Deployment pointer updates
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    /// Base URL of the control plane (e.g., "http://localhost:8080")
    base_url: String,
    /// Bearer token sent with every request, if any
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl ControlPlaneClient {
    /// Create a new control-plane client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the control-plane API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use sluice_client::ControlPlaneClient;
    ///
    /// let client = ControlPlaneClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new control-plane client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use sluice_client::ControlPlaneClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ControlPlaneClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        }
    }

    /// Send `token` as a bearer token with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the control plane
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an API URL below the base URL; each segment is percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Start a request against the given path segments
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let builder = self.client.request(method, self.url(segments)?);

        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await?;
        Ok(())
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = error_message(&error_text);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }

        Err(ClientError::api_error(status.as_u16(), message))
    }
}

/// Extract the message of a `{"error": "..."}` body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.to_string())
}
