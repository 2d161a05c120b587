use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::{finish_batch, TerraformArgs};
use crate::config::VarsyncConfig;
use crate::terraform::definitions::{load_definitions, merge_overrides, ResolvedVariable};
use crate::terraform::model::{VarAttributes, VarParent};
use crate::terraform::sync::sync_vars;
use crate::terraform::TfcClient;

/// Push Terraform variable definitions into an HCP Terraform workspace.
#[derive(Parser, Debug)]
pub struct ImportVarsCommand {
    /// Path to variables.tf
    pub variables_tf: PathBuf,
    /// Workspace name
    #[clap(env = "TFC_WORKSPACE")]
    pub workspace: String,
    /// Optional terraform.tfvars whose values override the declared defaults
    pub tfvars: Option<PathBuf>,
    /// Rewrite existing sensitive variables, whose values cannot be compared
    #[clap(long)]
    pub overwrite: bool,
    /// Organization owning the workspace
    #[clap(long, env = "TFC_ORG")]
    pub org: Option<String>,
    #[clap(flatten)]
    pub terraform: TerraformArgs,
}

/// `name: value (sensitive=...)` with sensitive values masked.
pub fn describe(variable: &ResolvedVariable) -> String {
    let value = if variable.definition.sensitive {
        "********".to_string()
    } else {
        variable.rendered()
    };
    format!(
        "- {}: {value} (sensitive={})",
        variable.name(),
        variable.definition.sensitive
    )
}

impl ImportVarsCommand {
    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let settings = config.terraform_settings(self.terraform.overrides(self.org.as_ref()))?;
        let organization = settings.organization()?;

        let (definitions, overrides) =
            load_definitions(&self.variables_tf, self.tfvars.as_deref())?;
        let resolved = merge_overrides(definitions, &overrides);

        println!("Final variables to push:");
        for variable in &resolved {
            println!("{}", describe(variable));
        }

        let client = TfcClient::from_settings(&settings)?;
        let workspace = client
            .get_workspace(organization, &self.workspace)
            .await
            .context("Error fetching workspace")?;
        println!("🔗 Workspace {} ({})", workspace.attributes.name, workspace.id);

        let vars: Vec<VarAttributes> = resolved.iter().map(VarAttributes::from).collect();
        let report = sync_vars(
            &client,
            VarParent::Workspace(workspace.id),
            &vars,
            self.overwrite,
        )
        .await?;
        finish_batch(report)
    }
}
