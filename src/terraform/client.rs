use anyhow::{Context, Result};
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};

use super::model::{Document, Var, VarAttributes, VarParent, VarResource, Workspace};
use crate::config::TerraformSettings;
use crate::error::{decode_json, error_for_status, ApiError};
use crate::http::build_http_client;

const JSON_API: &str = "application/vnd.api+json";

/// Client for the HCP Terraform / Terraform Enterprise v2 API.
#[derive(Clone)]
pub struct TfcClient {
    client: reqwest::Client,
    address: Url,
    token: String,
}

impl std::fmt::Debug for TfcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfcClient")
            .field("address", &self.address.as_str())
            .field("token", &"***redacted***")
            .finish_non_exhaustive()
    }
}

impl TfcClient {
    pub fn new(client: reqwest::Client, address: Url, token: String) -> Self {
        Self {
            client,
            address,
            token,
        }
    }

    pub fn from_settings(settings: &TerraformSettings) -> Result<Self> {
        Ok(Self::new(
            build_http_client(settings.timeout)?,
            settings.address.clone(),
            settings.token.clone(),
        ))
    }

    #[cfg(test)]
    pub fn for_address(address: &str, token: &str) -> Self {
        Self::new(
            reqwest::Client::new(),
            crate::http::parse_endpoint(address).unwrap(),
            token.to_string(),
        )
    }

    fn base_api(&self, method: Method, endpoint: &str) -> Result<reqwest::RequestBuilder> {
        let url = self.address.join(&format!("api/v2/{endpoint}"))?;
        debug!("🔗 Request URL: {method} {url}");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API))
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        let response_text = error_for_status(response).await?.text().await?;
        decode_json(&response_text, what)
    }

    pub async fn get_workspace(&self, organization: &str, name: &str) -> Result<Workspace> {
        debug!("get_workspace called for {organization}/{name}");
        let request = self.base_api(
            Method::GET,
            &format!("organizations/{organization}/workspaces/{name}"),
        )?;
        match self.send_json::<Document<Workspace>>(request, "workspace").await {
            Ok(doc) => Ok(doc.data),
            Err(e) if e.downcast_ref::<ApiError>().map(ApiError::status) == Some(404) => {
                Err(e.context(format!("Workspace {organization}/{name} not found")))
            }
            Err(e) => Err(e.context(format!("Error fetching workspace {organization}/{name}"))),
        }
    }

    /// Variables currently attached to `parent`.
    pub async fn list_vars(&self, parent: &VarParent) -> Result<Vec<Var>> {
        let endpoint = match parent {
            VarParent::Workspace(id) => format!("workspaces/{id}/vars"),
            VarParent::Varset(id) => format!("varsets/{id}/relationships/vars"),
        };
        let request = self.base_api(Method::GET, &endpoint)?;
        let doc: Document<Vec<Var>> = self
            .send_json(request, "variable list")
            .await
            .context("Error fetching existing vars")?;
        debug!("Fetched {} vars", doc.data.len());
        Ok(doc.data)
    }

    pub async fn create_var(&self, attributes: VarAttributes, parent: &VarParent) -> Result<Var> {
        let request = self
            .base_api(Method::POST, "vars")?
            .json(&VarResource::new(attributes, parent));
        let doc: Document<Var> = self.send_json(request, "variable").await?;
        Ok(doc.data)
    }

    pub async fn update_var(
        &self,
        var_id: &str,
        attributes: VarAttributes,
        parent: &VarParent,
    ) -> Result<Var> {
        let request = self
            .base_api(Method::PATCH, &format!("vars/{var_id}"))?
            .json(&VarResource::new(attributes, parent));
        let doc: Document<Var> = self.send_json(request, "variable").await?;
        Ok(doc.data)
    }
}
