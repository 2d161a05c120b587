use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use super::ServiceNowArgs;
use crate::config::VarsyncConfig;
use crate::servicenow::actions::ACTION_CATEGORY;
use crate::servicenow::model::action::NewFlowAction;
use crate::servicenow::traits::FlowActionOperations;
use crate::servicenow::ServiceNowClient;

/// Create a Flow Designer action from an inputs file.
#[derive(Parser, Debug)]
pub struct CreateActionCommand {
    #[clap(long)]
    pub action_name: String,
    /// JSON file with the action inputs, e.g. the output of `get-varsets`
    #[clap(long)]
    pub inputs_file: PathBuf,
    /// Application scope; defaults to the configured scope
    #[clap(long)]
    pub scope: Option<String>,
    #[clap(long, default_value = ACTION_CATEGORY)]
    pub category: String,
    #[clap(flatten)]
    pub servicenow: ServiceNowArgs,
}

pub fn read_inputs(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading inputs file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Inputs file {} is not valid JSON", path.display()))
}

impl CreateActionCommand {
    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let inputs = read_inputs(&self.inputs_file)?;
        let settings = config.servicenow_settings((&self.servicenow).into())?;
        let scope = self.scope.as_deref().unwrap_or(&settings.scope);
        let client = ServiceNowClient::connect(&settings).await?;

        let body = serde_json::to_value(NewFlowAction {
            name: &self.action_name,
            scope,
            category: &self.category,
            inputs: &inputs,
            active: true,
        })?;
        let created = client
            .create_flow_action(&body)
            .await
            .context("Failed to create action")?;

        println!("✅ Created Flow Designer Action:");
        println!("{}", serde_json::to_string_pretty(&created)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_inputs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "region", "label": "Region"}}]"#).unwrap();
        let inputs = read_inputs(file.path()).unwrap();
        assert_eq!(inputs[0]["name"], "region");
    }

    #[test]
    fn test_invalid_inputs_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = read_inputs(file.path()).unwrap_err();
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[test]
    fn test_defaults() {
        let cmd = CreateActionCommand::parse_from([
            "create-action",
            "--action-name",
            "Provision",
            "--inputs-file",
            "inputs.json",
        ]);
        assert_eq!(cmd.category, "Custom");
        assert_eq!(cmd.scope, None);
    }
}
