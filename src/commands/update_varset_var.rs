use anyhow::Result;
use clap::{ArgAction, Parser};

use super::{finish_batch, TerraformArgs};
use crate::config::VarsyncConfig;
use crate::sync::upsert_all;
use crate::terraform::model::{VarAttributes, VarParent};
use crate::terraform::sync::{TfcVarTarget, TERRAFORM_CATEGORY};
use crate::terraform::TfcClient;

/// Set the value of one variable in an HCP Terraform variable set.
#[derive(Parser, Debug)]
pub struct UpdateVarsetVarCommand {
    /// Variable set id, e.g. varset-RrCjpg265NAWhdrh
    pub varset_id: String,
    pub key: String,
    pub value: String,
    /// Store the value as sensitive (the default)
    #[clap(long, overrides_with = "no_sensitive", action = ArgAction::SetTrue)]
    pub sensitive: bool,
    /// Store the value in plain text
    #[clap(long, overrides_with = "sensitive", action = ArgAction::SetTrue)]
    pub no_sensitive: bool,
    #[clap(flatten)]
    pub terraform: TerraformArgs,
}

impl UpdateVarsetVarCommand {
    pub fn is_sensitive(&self) -> bool {
        !self.no_sensitive
    }

    pub fn attributes(&self) -> VarAttributes {
        VarAttributes {
            key: self.key.clone(),
            value: Some(self.value.clone()),
            description: None,
            category: TERRAFORM_CATEGORY.to_string(),
            hcl: false,
            sensitive: self.is_sensitive(),
        }
    }

    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let settings = config.terraform_settings(self.terraform.overrides(None))?;
        let client = TfcClient::from_settings(&settings)?;

        // Sensitive values cannot be read back, so an existing one is always rewritten
        let target = TfcVarTarget::load(&client, VarParent::Varset(self.varset_id.clone()), true).await?;
        let report = upsert_all(&target, &[self.attributes()]).await;
        finish_batch(report)?;
        println!("✅ Updated '{}' in variable set {}", self.key, self.varset_id);
        Ok(())
    }
}
