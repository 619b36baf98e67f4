//! Configuration module
//!
//! Handles CLI configuration including the control-plane URL and credentials.

use sluice_client::ControlPlaneClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the control-plane API
    pub api_url: String,
    /// Bearer token, if the control plane requires one
    pub token: Option<String>,
    /// Retries for reads that observe a transiently inconsistent pipeline
    pub read_retries: u32,
}

impl Config {
    /// Build a control-plane client for this configuration
    pub fn client(&self) -> ControlPlaneClient {
        let client = ControlPlaneClient::new(&self.api_url);

        match &self.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_api_url() {
        let config = Config {
            api_url: "http://control-plane:9000/".to_string(),
            token: Some("abc".to_string()),
            read_retries: 3,
        };

        let client = config.client();
        assert_eq!(client.base_url(), "http://control-plane:9000");
    }
}
