use std::fmt;

use anyhow::{Context, Result};
use custom_error::custom_error;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

custom_error! {pub AuthError
    MissingRefreshInputs{missing: String} = "Refresh token flow skipped: {missing} not set",
    RefreshRejected{status: u16, body: String} = "Failed to refresh access token (HTTP {status}): {body}",
    NoAccessToken = "No access token returned during refresh",
}

/// Where the bearer token comes from. An already-issued token always wins over
/// the refresh inputs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSource {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Refresh(RefreshGrant),
}

#[derive(Clone, PartialEq, Eq)]
pub struct RefreshGrant {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Serialize)]
struct RefreshForm<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSource")
            .field("token", &self.token.as_ref().map(|_| "***redacted***"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***redacted***"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***redacted***"))
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***redacted***)"),
            Credentials::Refresh(grant) => f
                .debug_struct("Refresh")
                .field("client_id", &grant.client_id)
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"***redacted***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

fn present(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CredentialSource {
    pub fn into_credentials(self) -> Result<Credentials, AuthError> {
        if let Some(token) = present(self.token.as_ref()) {
            return Ok(Credentials::Token(token.trim().to_string()));
        }

        let mut missing = Vec::new();
        if present(self.refresh_token.as_ref()).is_none() {
            missing.push("SN_REFRESH_TOKEN");
        }
        if present(self.client_id.as_ref()).is_none() {
            missing.push("SN_CLIENT_ID");
        }
        if present(self.client_secret.as_ref()).is_none() {
            missing.push("SN_CLIENT_SECRET");
        }

        match (self.refresh_token, self.client_id, self.client_secret) {
            (Some(refresh_token), Some(client_id), Some(client_secret)) if missing.is_empty() => {
                Ok(Credentials::Refresh(RefreshGrant {
                    refresh_token,
                    client_id,
                    client_secret,
                }))
            }
            _ => Err(AuthError::MissingRefreshInputs {
                missing: missing.join(", "),
            }),
        }
    }
}

/// Exchanges a refresh token at `{endpoint}/oauth_token.do`. The call is made
/// once; any non-200 answer or a body without `access_token` is an error.
pub async fn exchange_refresh_token(
    client: &reqwest::Client,
    endpoint: &Url,
    grant: &RefreshGrant,
) -> Result<AccessToken> {
    let url = endpoint.join("oauth_token.do")?;
    debug!("🔗 Token URL: {url}");

    let response = client
        .post(url)
        .form(&RefreshForm {
            grant_type: "refresh_token",
            refresh_token: &grant.refresh_token,
            client_id: &grant.client_id,
            client_secret: &grant.client_secret,
        })
        .send()
        .await
        .context("Failed to send refresh token request")?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status != reqwest::StatusCode::OK {
        return Err(AuthError::RefreshRejected {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let tokens: TokenResponse =
        serde_json::from_str(&body).context("Failed to parse token endpoint response")?;
    match tokens.access_token.filter(|t| !t.is_empty()) {
        Some(token) => {
            info!(
                "🔑 Access token refreshed, expires in {} seconds",
                tokens
                    .expires_in
                    .map_or_else(|| "?".to_string(), |s| s.to_string())
            );
            Ok(AccessToken {
                token,
                expires_in: tokens.expires_in,
            })
        }
        None => Err(AuthError::NoAccessToken.into()),
    }
}

/// Resolves the bearer token used for the rest of the process lifetime.
pub async fn acquire_token(
    client: &reqwest::Client,
    endpoint: &Url,
    source: CredentialSource,
) -> Result<AccessToken> {
    match source.into_credentials()? {
        Credentials::Token(token) => {
            info!("🔑 Using access token supplied out of band");
            Ok(AccessToken {
                token,
                expires_in: None,
            })
        }
        Credentials::Refresh(grant) => {
            println!("No access token found. Attempting to refresh...");
            let token = exchange_refresh_token(client, endpoint, &grant).await?;
            println!("Access token refreshed successfully.");
            if let Some(expires_in) = token.expires_in {
                println!("Expires in: {expires_in} seconds");
            }
            Ok(token)
        }
    }
}
