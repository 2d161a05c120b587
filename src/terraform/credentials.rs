use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::home_dir;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "app.terraform.io";

#[derive(Debug, Deserialize)]
struct CliCredentials {
    #[serde(default)]
    credentials: HashMap<String, HostCredentials>,
}

#[derive(Deserialize)]
struct HostCredentials {
    token: String,
}

impl std::fmt::Debug for HostCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCredentials")
            .field("token", &"***redacted***")
            .finish()
    }
}

/// `~/.terraform.d/credentials.tfrc.json`, written by `terraform login`.
pub fn default_credentials_file() -> Result<PathBuf> {
    Ok(home_dir()
        .context("Could not determine home directory")?
        .join(".terraform.d")
        .join("credentials.tfrc.json"))
}

/// Read the API token stored for `host` in a Terraform CLI credentials file.
pub fn read_cli_token(path: &Path, host: &str) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading TFC credentials from {}", path.display()))?;
    let parsed: CliCredentials = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    parsed
        .credentials
        .get(host)
        .map(|c| c.token.clone())
        .with_context(|| format!("No token for {host} in {}", path.display()))
}
