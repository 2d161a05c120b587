use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::http::parse_endpoint;
use crate::servicenow::auth::CredentialSource;
use crate::terraform::credentials::{default_credentials_file, read_cli_token, DEFAULT_HOST};
use crate::CONFIG_FILE;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SCOPE: &str = "global";
pub const DEFAULT_TFC_ADDRESS: &str = "https://app.terraform.io";

const REDACTED: &str = "***redacted***";

/// Expands environment variables in a string value.
/// Supports ${VAR} and $VAR syntax.
pub fn expand_env_vars(value: &str) -> Result<String> {
    shellexpand::env(value)
        .map(|s| s.into_owned())
        .map_err(|e| anyhow::anyhow!("Failed to expand environment variable in '{value}': {e}"))
}

/// Expand a configured value, treating an empty result as unset.
fn expand_option(value: Option<&String>) -> Result<Option<String>> {
    match value {
        Some(raw) => {
            let expanded = expand_env_vars(raw)?;
            Ok(Some(expanded).filter(|v| !v.trim().is_empty()))
        }
        None => Ok(None),
    }
}

/// Drop a blank flag or environment value so the file's value applies.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn redact(value: Option<&String>) -> Option<String> {
    value.map(|_| REDACTED.to_string())
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct VarsyncConfig {
    pub timeout_secs: Option<u64>,
    pub servicenow: Option<ServiceNowConfig>,
    pub terraform: Option<TerraformConfig>,
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ServiceNowConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
}

impl std::fmt::Debug for ServiceNowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceNowConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| REDACTED))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| REDACTED))
            .field("scope", &self.scope)
            .finish()
    }
}

impl ServiceNowConfig {
    /// Fields set in `overrides` replace the ones in `self`.
    #[must_use]
    pub fn merged(self, overrides: ServiceNowConfig) -> Self {
        Self {
            endpoint: overrides.endpoint.or(self.endpoint),
            token: overrides.token.or(self.token),
            refresh_token: overrides.refresh_token.or(self.refresh_token),
            client_id: overrides.client_id.or(self.client_id),
            client_secret: overrides.client_secret.or(self.client_secret),
            scope: overrides.scope.or(self.scope),
        }
    }

    /// Expand `${VAR}` references in values read from the config file.
    fn expanded(&self) -> Result<Self> {
        Ok(Self {
            endpoint: expand_option(self.endpoint.as_ref())?,
            token: expand_option(self.token.as_ref())?,
            refresh_token: expand_option(self.refresh_token.as_ref())?,
            client_id: expand_option(self.client_id.as_ref())?,
            client_secret: expand_option(self.client_secret.as_ref())?,
            scope: expand_option(self.scope.as_ref())?,
        })
    }

    fn non_blank(self) -> Self {
        Self {
            endpoint: non_blank(self.endpoint),
            token: non_blank(self.token),
            refresh_token: non_blank(self.refresh_token),
            client_id: non_blank(self.client_id),
            client_secret: non_blank(self.client_secret),
            scope: non_blank(self.scope),
        }
    }

    fn redacted(&self) -> Self {
        Self {
            token: redact(self.token.as_ref()),
            refresh_token: redact(self.refresh_token.as_ref()),
            client_secret: redact(self.client_secret.as_ref()),
            ..self.clone()
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct TerraformConfig {
    pub address: Option<String>,
    pub organization: Option<String>,
    pub token: Option<String>,
    pub credentials_file: Option<PathBuf>,
}

impl std::fmt::Debug for TerraformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerraformConfig")
            .field("address", &self.address)
            .field("organization", &self.organization)
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .field("credentials_file", &self.credentials_file)
            .finish()
    }
}

impl TerraformConfig {
    /// Fields set in `overrides` replace the ones in `self`.
    #[must_use]
    pub fn merged(self, overrides: TerraformConfig) -> Self {
        Self {
            address: overrides.address.or(self.address),
            organization: overrides.organization.or(self.organization),
            token: overrides.token.or(self.token),
            credentials_file: overrides.credentials_file.or(self.credentials_file),
        }
    }

    /// Expand `${VAR}` references in values read from the config file.
    fn expanded(&self) -> Result<Self> {
        Ok(Self {
            address: expand_option(self.address.as_ref())?,
            organization: expand_option(self.organization.as_ref())?,
            token: expand_option(self.token.as_ref())?,
            credentials_file: self.credentials_file.clone(),
        })
    }

    fn non_blank(self) -> Self {
        Self {
            address: non_blank(self.address),
            organization: non_blank(self.organization),
            token: non_blank(self.token),
            credentials_file: self.credentials_file,
        }
    }

    fn redacted(&self) -> Self {
        Self {
            token: redact(self.token.as_ref()),
            ..self.clone()
        }
    }
}

/// Everything needed to talk to a ServiceNow instance, validated up front.
#[derive(Debug, Clone)]
pub struct ServiceNowSettings {
    pub endpoint: Url,
    pub credentials: CredentialSource,
    pub scope: String,
    pub timeout: Duration,
}

/// Everything needed to talk to HCP Terraform, validated up front.
#[derive(Clone)]
pub struct TerraformSettings {
    pub address: Url,
    pub organization: Option<String>,
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for TerraformSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerraformSettings")
            .field("address", &self.address.as_str())
            .field("organization", &self.organization)
            .field("token", &REDACTED)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TerraformSettings {
    /// The organization, required by workspace-scoped operations.
    pub fn organization(&self) -> Result<&str> {
        self.organization
            .as_deref()
            .context("Terraform organization is not set (use --org, TFC_ORG or [terraform].organization)")
    }
}

impl VarsyncConfig {
    pub fn from_file(config_path: Option<&PathBuf>) -> Result<Self> {
        let path = config_path.cloned().unwrap_or_else(|| {
            let default_path = CONFIG_FILE.as_path().to_path_buf();
            info!("Using configuration path: {}", default_path.display());
            default_path
        });

        // A missing file is an empty config; every option can come from flags or env
        let toml_config = if path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Error reading config file {}", path.display()))?
        } else {
            String::new()
        };
        let mut config = Self::from_str(&toml_config)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.path = Some(path);
        Ok(config)
    }

    pub fn from_str(config: &str) -> Result<Self> {
        let config: VarsyncConfig = toml::from_str(config)?;
        info!(
            "Loaded config: servicenow={}, terraform={}",
            config.servicenow.is_some(),
            config.terraform.is_some()
        );
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Merge the file's `[servicenow]` table with `overrides` and validate
    /// the result. Only file values go through `${VAR}` expansion; flag and
    /// environment values are used as given. No network call happens here.
    pub fn servicenow_settings(&self, overrides: ServiceNowConfig) -> Result<ServiceNowSettings> {
        let merged = self
            .servicenow
            .clone()
            .unwrap_or_default()
            .expanded()?
            .merged(overrides.non_blank());

        let endpoint = merged
            .endpoint
            .context("ServiceNow instance URL is not set (use --instance, SNOW_URL or [servicenow].endpoint)")?;
        let endpoint = parse_endpoint(&endpoint)?;

        let credentials = CredentialSource {
            token: merged.token,
            refresh_token: merged.refresh_token,
            client_id: merged.client_id,
            client_secret: merged.client_secret,
        };
        let scope = merged.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        Ok(ServiceNowSettings {
            endpoint,
            credentials,
            scope,
            timeout: self.timeout(),
        })
    }

    /// Merge the file's `[terraform]` table with `overrides` and validate the
    /// result, expanding only file values. Without an explicit token, the Terraform CLI credentials file
    /// is read for the API host.
    pub fn terraform_settings(&self, overrides: TerraformConfig) -> Result<TerraformSettings> {
        let merged = self
            .terraform
            .clone()
            .unwrap_or_default()
            .expanded()?
            .merged(overrides.non_blank());

        let address = merged
            .address
            .unwrap_or_else(|| DEFAULT_TFC_ADDRESS.to_string());
        let address = parse_endpoint(&address)?;
        let organization = merged.organization;

        let token = match merged.token {
            Some(token) => token,
            None => {
                let path = match merged.credentials_file {
                    Some(path) => path,
                    None => default_credentials_file()?,
                };
                let host = address.host_str().unwrap_or(DEFAULT_HOST);
                read_cli_token(&path, host).context(
                    "No Terraform API token found (use TFC_TOKEN, [terraform].token or `terraform login`)",
                )?
            }
        };

        Ok(TerraformSettings {
            address,
            organization,
            token,
            timeout: self.timeout(),
        })
    }

    /// The configuration as TOML with every secret replaced.
    pub fn to_redacted_string(&self) -> Result<String> {
        let redacted = VarsyncConfig {
            timeout_secs: self.timeout_secs,
            servicenow: self.servicenow.as_ref().map(ServiceNowConfig::redacted),
            terraform: self.terraform.as_ref().map(TerraformConfig::redacted),
            path: None,
        };
        toml::to_string(&redacted).map_err(std::convert::Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_CONFIG: &str = r#"
timeout_secs = 10

[servicenow]
endpoint = "https://dev123.service-now.com"
refresh_token = "r-token"
client_id = "cid"
client_secret = "shh"

[terraform]
organization = "acme"
token = "tfc-token"
"#;

    #[test]
    fn test_get_config() {
        let config = VarsyncConfig::from_str(TEST_CONFIG).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        let servicenow = config.servicenow.unwrap();
        assert_eq!(servicenow.client_id.as_deref(), Some("cid"));
        assert_eq!(config.terraform.unwrap().organization.as_deref(), Some("acme"));
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = VarsyncConfig::from_str("").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.servicenow.is_none());
    }

    #[test]
    fn non_existing_path() {
        let path = PathBuf::from("non-existing.toml");
        let config = VarsyncConfig::from_file(Some(&path)).unwrap();
        assert_eq!(config.path, Some(path));
        assert!(config.servicenow.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{TEST_CONFIG}").unwrap();
        let path = file.path().to_path_buf();

        let config = VarsyncConfig::from_file(Some(&path)).unwrap();
        assert!(config.servicenow.is_some());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(VarsyncConfig::from_str("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_servicenow_settings_flags_override_file() {
        let config = VarsyncConfig::from_str(TEST_CONFIG).unwrap();
        let settings = config
            .servicenow_settings(ServiceNowConfig {
                endpoint: Some("https://other.service-now.com".to_string()),
                token: Some("direct".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(settings.endpoint.as_str(), "https://other.service-now.com/");
        assert_eq!(settings.credentials.token.as_deref(), Some("direct"));
        assert_eq!(settings.credentials.client_id.as_deref(), Some("cid"));
        assert_eq!(settings.scope, DEFAULT_SCOPE);
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_endpoint_fails_fast() {
        let config = VarsyncConfig::default();
        let err = config
            .servicenow_settings(ServiceNowConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("SNOW_URL"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = VarsyncConfig::default();
        let settings = config
            .servicenow_settings(ServiceNowConfig {
                endpoint: Some("https://dev123.service-now.com".to_string()),
                token: Some("  ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.credentials.token, None);
    }

    #[test]
    fn test_flag_values_are_not_expanded() {
        let config = VarsyncConfig::default();
        let settings = config
            .servicenow_settings(ServiceNowConfig {
                endpoint: Some("https://dev123.service-now.com".to_string()),
                token: Some("abc$HOME".to_string()),
                refresh_token: Some("r${HOME}".to_string()),
                client_id: Some("cid".to_string()),
                client_secret: Some("pa$$word".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.credentials.token.as_deref(), Some("abc$HOME"));
        assert_eq!(settings.credentials.refresh_token.as_deref(), Some("r${HOME}"));
        assert_eq!(settings.credentials.client_secret.as_deref(), Some("pa$$word"));

        let settings = config
            .terraform_settings(TerraformConfig {
                token: Some("tfc$HOME".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.token, "tfc$HOME");
    }

    #[test]
    fn test_file_values_are_expanded() {
        let config = VarsyncConfig::from_str(indoc::indoc! {r#"
            [servicenow]
            endpoint = "https://dev123.service-now.com"
            client_secret = "${VARSYNC_TEST_SECRET}"
        "#})
        .unwrap();
        std::env::set_var("VARSYNC_TEST_SECRET", "from-env");
        let settings = config.servicenow_settings(ServiceNowConfig::default()).unwrap();
        assert_eq!(settings.credentials.client_secret.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_terraform_settings() {
        let config = VarsyncConfig::from_str(TEST_CONFIG).unwrap();
        let settings = config.terraform_settings(TerraformConfig::default()).unwrap();
        assert_eq!(settings.address.as_str(), "https://app.terraform.io/");
        assert_eq!(settings.organization().unwrap(), "acme");
        assert_eq!(settings.token, "tfc-token");
        assert!(format!("{settings:?}").contains(REDACTED));
    }

    #[test]
    fn test_terraform_token_from_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"credentials": {{"tfe.example.com": {{"token": "from-file"}}}}}}"#
        )
        .unwrap();

        let config = VarsyncConfig::default();
        let settings = config
            .terraform_settings(TerraformConfig {
                address: Some("https://tfe.example.com".to_string()),
                credentials_file: Some(file.path().to_path_buf()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.token, "from-file");
        assert!(settings.organization().is_err());
    }

    #[test]
    fn test_redacted_string_hides_secrets() {
        let config = VarsyncConfig::from_str(TEST_CONFIG).unwrap();
        let shown = config.to_redacted_string().unwrap();
        assert!(shown.contains("client_id = \"cid\""));
        assert!(!shown.contains("shh"));
        assert!(!shown.contains("r-token"));
        assert!(!shown.contains("tfc-token"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = VarsyncConfig::from_str(TEST_CONFIG).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("shh"));
        assert!(!debug.contains("tfc-token"));
    }
}
