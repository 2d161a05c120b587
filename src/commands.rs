use std::fs::File;

use anyhow::Result;
use clap::Args;
use log::{info, LevelFilter};
use simplelog::{Config, WriteLogger};

use crate::config::{ServiceNowConfig, TerraformConfig};
use crate::sync::BatchReport;

pub mod clone_varset;
pub mod config;
pub mod create_action;
pub mod create_varset;
pub mod get_varsets;
pub mod import_vars;
pub mod sync_action;
pub mod update_varset_var;

/// Connection options for ServiceNow. Each one overrides the `[servicenow]`
/// table of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceNowArgs {
    /// Instance URL, e.g. https://dev123.service-now.com
    #[clap(long = "instance", alias = "snow-url", env = "SNOW_URL")]
    pub endpoint: Option<String>,
    /// Already-issued access token; skips the refresh exchange
    #[clap(long, env = "OAUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[clap(long, env = "SN_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,
    #[clap(long, env = "SN_CLIENT_ID")]
    pub client_id: Option<String>,
    #[clap(long, env = "SN_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

impl From<&ServiceNowArgs> for ServiceNowConfig {
    fn from(args: &ServiceNowArgs) -> Self {
        ServiceNowConfig {
            endpoint: args.endpoint.clone(),
            token: args.token.clone(),
            refresh_token: args.refresh_token.clone(),
            client_id: args.client_id.clone(),
            client_secret: args.client_secret.clone(),
            scope: None,
        }
    }
}

/// Connection options for HCP Terraform. Each one overrides the
/// `[terraform]` table of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct TerraformArgs {
    /// API token; defaults to the one stored by `terraform login`
    #[clap(long = "tfc-token", env = "TFC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Terraform API address
    #[clap(long = "tfc-address")]
    pub address: Option<String>,
}

impl TerraformArgs {
    pub fn overrides(&self, organization: Option<&String>) -> TerraformConfig {
        TerraformConfig {
            address: self.address.clone(),
            organization: organization.cloned(),
            token: self.token.clone(),
            credentials_file: None,
        }
    }
}

/// Print the batch summary and fail when any item failed.
pub fn finish_batch(report: BatchReport) -> Result<()> {
    println!("📊 {}", report.summary());
    for failure in report.failures() {
        println!("{failure}");
    }
    report.into_result()?;
    Ok(())
}

pub fn setup_logging(log_level: &str) -> Result<()> {
    let log_dir = crate::get_state_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join(format!(
        "varsync-{}.log",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    ));

    let log_level = match log_level.to_lowercase().as_str() {
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    };

    WriteLogger::init(log_level, Config::default(), File::create(&log_file_path)?)?;
    info!("Logging to: {}", log_file_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Outcome;

    #[test]
    fn test_args_become_config_overrides() {
        let args = ServiceNowArgs {
            endpoint: Some("https://dev123.service-now.com".to_string()),
            client_id: Some("cid".to_string()),
            ..Default::default()
        };
        let overrides = ServiceNowConfig::from(&args);
        assert_eq!(overrides.endpoint, args.endpoint);
        assert_eq!(overrides.client_id.as_deref(), Some("cid"));
        assert_eq!(overrides.token, None);
    }

    #[derive(clap::Parser)]
    struct Wrapper {
        #[clap(flatten)]
        servicenow: ServiceNowArgs,
    }

    #[test]
    fn test_snow_url_alias() {
        use clap::Parser;
        for flag in ["--instance", "--snow-url"] {
            let parsed = Wrapper::parse_from(["varsync", flag, "https://dev123.service-now.com"]);
            assert_eq!(
                parsed.servicenow.endpoint.as_deref(),
                Some("https://dev123.service-now.com")
            );
        }
    }

    #[test]
    fn test_finish_batch_fails_on_any_failed_item() {
        let mut report = BatchReport::default();
        report.push("a", Outcome::Created);
        assert!(finish_batch(report.clone()).is_ok());

        report.push("b", Outcome::Failed("HTTP 500".to_string()));
        let err = finish_batch(report).unwrap_err();
        assert!(err.to_string().contains("1 of 2 items failed"));
    }
}
