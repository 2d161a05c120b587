use anyhow::Result;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};

/// Base HTTP client for the ServiceNow REST API.
/// Holds the bearer token obtained at start-up and builds authenticated requests.
#[derive(Clone)]
pub struct BaseClient {
    pub client: reqwest::Client,
    pub endpoint: Url,
    token: String,
}

impl std::fmt::Debug for BaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"***redacted***")
            .finish_non_exhaustive()
    }
}

impl BaseClient {
    pub fn new(client: reqwest::Client, endpoint: Url, token: String) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }

    /// Build an authenticated request for a path relative to the instance URL
    pub fn base_api(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = self.endpoint.join(path)?;
        debug!("🔗 Request URL: {method} {url}");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json"))
    }
}
