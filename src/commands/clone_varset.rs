use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use super::{finish_batch, ServiceNowArgs};
use crate::config::VarsyncConfig;
use crate::servicenow::traits::VariableSetOperations;
use crate::servicenow::varsets::{get_or_create_variable_set, sync_variables};
use crate::servicenow::ServiceNowClient;

/// Clone a ServiceNow variable set and all of its variables.
#[derive(Parser, Debug)]
pub struct CloneVarsetCommand {
    /// Source variable set name
    #[clap(value_name = "SOURCE")]
    pub pos_source: Option<String>,
    /// Target variable set name
    #[clap(value_name = "TARGET")]
    pub pos_target: Option<String>,
    /// Source variable set name (overrides the positional one)
    #[clap(long)]
    pub source: Option<String>,
    /// Target variable set name (overrides the positional one)
    #[clap(long)]
    pub target: Option<String>,
    #[clap(flatten)]
    pub servicenow: ServiceNowArgs,
}

impl CloneVarsetCommand {
    /// Flags win over positionals; both names are required.
    pub fn names(&self) -> Result<(&str, &str)> {
        let source = self.source.as_ref().or(self.pos_source.as_ref());
        let target = self.target.as_ref().or(self.pos_target.as_ref());
        match (source, target) {
            (Some(source), Some(target)) => Ok((source.as_str(), target.as_str())),
            _ => Err(anyhow::anyhow!(
                "You must provide a source and target variable set name (either as positional args or with --source/--target)"
            )),
        }
    }

    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let (source, target) = self.names()?;
        let settings = config.servicenow_settings((&self.servicenow).into())?;
        let client = ServiceNowClient::connect(&settings).await?;

        println!("🔍 Looking up source variable set...");
        let source_set = client
            .find_variable_set(source)
            .await?
            .with_context(|| format!("Source variable set '{source}' not found"))?;

        let variables = client
            .list_variables(&source_set.sys_id)
            .await
            .with_context(|| format!("Failed to list variables of '{source}'"))?;
        println!("Found {} variables in source set.", variables.len());

        let (target_set, created) =
            get_or_create_variable_set(&client, target, &format!("Cloned from {source}")).await?;
        if created {
            println!("➕ Created new variable set '{target}'.");
        } else {
            println!("Target variable set '{target}' already exists, using existing set.");
        }
        info!("Cloning {source} ({}) into {target} ({})", source_set.sys_id, target_set.sys_id);

        let report = sync_variables(&client, &target_set.sys_id, &variables).await;
        finish_batch(report)?;
        println!("✅ Cloned all variables from {source} to {target}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["clone-varset", "A", "B"], ("A", "B"))]
    #[case(&["clone-varset", "A", "B", "--target", "C"], ("A", "C"))]
    #[case(&["clone-varset", "--source", "X", "--target", "Y"], ("X", "Y"))]
    fn test_flags_override_positionals(#[case] argv: &[&str], #[case] expected: (&str, &str)) {
        let cmd = CloneVarsetCommand::parse_from(argv);
        assert_eq!(cmd.names().unwrap(), expected);
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let cmd = CloneVarsetCommand::parse_from(["clone-varset", "A"]);
        assert!(cmd.names().is_err());
    }
}
