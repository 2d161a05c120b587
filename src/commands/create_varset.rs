use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use super::{finish_batch, ServiceNowArgs};
use crate::config::VarsyncConfig;
use crate::servicenow::model::variable::{
    TYPE_CHECKBOX, TYPE_MULTI_LINE_TEXT, TYPE_SINGLE_LINE_TEXT,
};
use crate::servicenow::model::CatalogVariable;
use crate::servicenow::varsets::{get_or_create_variable_set, sync_variables};
use crate::servicenow::ServiceNowClient;
use crate::terraform::definitions::{load_definitions, merge_overrides, ResolvedVariable};

const VARIABLE_PREFIX: &str = "tf_var_";
const MASKED_NAME_PARTS: [&str; 3] = ["password", "token", "secret"];

/// Create or update a ServiceNow variable set from Terraform variable definitions.
#[derive(Parser, Debug)]
pub struct CreateVarsetCommand {
    /// Directory containing variables.tf and terraform.tfvars
    #[clap(long)]
    pub dir: PathBuf,
    /// Name of the variable set to create or update
    #[clap(long)]
    pub varset_name: String,
    #[clap(flatten)]
    pub servicenow: ServiceNowArgs,
}

/// Catalog variable type code for a Terraform type constraint.
pub fn servicenow_type(terraform_type: Option<&str>) -> &'static str {
    let Some(terraform_type) = terraform_type else {
        return TYPE_SINGLE_LINE_TEXT;
    };
    let base = terraform_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "bool" => TYPE_CHECKBOX,
        "list" | "map" | "set" | "object" | "tuple" => TYPE_MULTI_LINE_TEXT,
        _ => TYPE_SINGLE_LINE_TEXT,
    }
}

fn is_masked(name: &str) -> bool {
    let name = name.to_lowercase();
    MASKED_NAME_PARTS.iter().any(|part| name.contains(part))
}

impl From<&ResolvedVariable> for CatalogVariable {
    fn from(variable: &ResolvedVariable) -> Self {
        let name = variable.name();
        let question_text = variable
            .definition
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| name.to_string());

        CatalogVariable {
            name: format!("{VARIABLE_PREFIX}{name}"),
            question_text: Some(question_text),
            var_type: Some(servicenow_type(variable.definition.var_type.as_deref()).to_string()),
            default_value: Some(variable.rendered()).filter(|v| !v.is_empty()),
            mask_type: is_masked(name).then(|| "password".to_string()),
            ..Default::default()
        }
    }
}

fn required_file(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if path.exists() {
        Ok(path)
    } else {
        Err(anyhow::anyhow!("{file_name} not found in {}", dir.display()))
    }
}

impl CreateVarsetCommand {
    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let variables_file = required_file(&self.dir, "variables.tf")?;
        let tfvars_file = required_file(&self.dir, "terraform.tfvars")?;
        let settings = config.servicenow_settings((&self.servicenow).into())?;

        println!("📄 Parsing Terraform variable definitions...");
        let (definitions, overrides) = load_definitions(&variables_file, Some(&tfvars_file))?;
        let variables: Vec<CatalogVariable> = merge_overrides(definitions, &overrides)
            .iter()
            .map(CatalogVariable::from)
            .collect();

        let client = ServiceNowClient::connect(&settings).await?;
        let name = &self.varset_name;
        let description = format!("Auto-generated from {name} Terraform definitions");
        let (set, created) = get_or_create_variable_set(&client, name, &description).await?;
        if created {
            println!("➕ Created variable set: {name} ({})", set.sys_id);
        } else {
            println!("Variable set exists: {name}");
        }

        let report = sync_variables(&client, &set.sys_id, &variables).await;
        finish_batch(report)?;
        println!("✅ All variables synced to ServiceNow.");
        Ok(())
    }
}
