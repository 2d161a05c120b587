use anyhow::Result;
use clap::Parser;

use super::{finish_batch, ServiceNowArgs};
use crate::config::VarsyncConfig;
use crate::servicenow::actions::{
    build_flow_inputs, resolve_input_target, sync_action_inputs, upsert_action_definition,
};
use crate::servicenow::varsets::{load_variable_sets, LoadedSet};
use crate::servicenow::ServiceNowClient;

/// Sync the variables of one or more variable sets into a Flow Designer action's inputs.
#[derive(Parser, Debug)]
pub struct SyncActionCommand {
    /// Variable set names to sync
    #[clap(long, required = true, num_args = 1..)]
    pub varsets: Vec<String>,
    /// Flow action to create or update
    #[clap(long)]
    pub action_name: String,
    /// Application scope; defaults to the configured scope
    #[clap(long)]
    pub scope: Option<String>,
    #[clap(flatten)]
    pub servicenow: ServiceNowArgs,
}

impl SyncActionCommand {
    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let settings = config.servicenow_settings((&self.servicenow).into())?;
        let scope = self.scope.as_deref().unwrap_or(&settings.scope);
        let client = ServiceNowClient::connect(&settings).await?;

        let loaded = load_variable_sets(&client, &self.varsets).await?;
        ensure_any_found(&loaded, &self.varsets)?;
        let inputs = build_flow_inputs(loaded.iter().map(|set| set.variables.as_slice()));

        let definition = upsert_action_definition(&client, &self.action_name, scope).await?;
        let target = resolve_input_target(&client, &definition.sys_id).await?;
        let report = sync_action_inputs(&client, &target, &inputs).await?;

        finish_batch(report)?;
        println!("🎯 Done! Flow Action and input variables are now synced.");
        Ok(())
    }
}

/// A found set without variables still yields the two fixed inputs; only
/// finding none of the requested sets stops the command.
fn ensure_any_found(loaded: &[LoadedSet], requested: &[String]) -> Result<()> {
    if loaded.is_empty() {
        anyhow::bail!("None of the variable sets were found: {}", requested.join(", "));
    }
    Ok(())
}
