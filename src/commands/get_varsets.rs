use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};

use super::ServiceNowArgs;
use crate::config::VarsyncConfig;
use crate::servicenow::model::variable::VariableSummary;
use crate::servicenow::traits::VariableSetOperations;
use crate::servicenow::varsets::load_variable_sets;
use crate::servicenow::ServiceNowClient;

/// Print the variables of one or more variable sets as JSON.
#[derive(Parser, Debug)]
pub struct GetVarsetsCommand {
    /// Variable set names to retrieve
    #[clap(long, required = true, num_args = 1..)]
    pub varsets: Vec<String>,
    /// Write the JSON to this file instead of stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    #[clap(flatten)]
    pub servicenow: ServiceNowArgs,
}

/// Variables of every found set, keyed by the requested name in request order.
pub async fn collect_varsets<C: VariableSetOperations>(
    client: &C,
    names: &[String],
) -> Result<Map<String, Value>> {
    let mut all_vars = Map::new();
    for loaded in load_variable_sets(client, names).await? {
        let summaries: Vec<VariableSummary> =
            loaded.variables.iter().map(VariableSummary::from).collect();
        all_vars.insert(loaded.requested, serde_json::to_value(summaries)?);
    }
    Ok(all_vars)
}

impl GetVarsetsCommand {
    pub async fn run(&self, config: &VarsyncConfig) -> Result<()> {
        let settings = config.servicenow_settings((&self.servicenow).into())?;
        let client = ServiceNowClient::connect(&settings).await?;

        let all_vars = collect_varsets(&client, &self.varsets).await?;
        let rendered = serde_json::to_string_pretty(&all_vars)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("Error writing {}", path.display()))?;
                println!("✅ Wrote {} variable sets to {}", all_vars.len(), path.display());
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servicenow::client::test_support::client_for;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_collect_skips_missing_sets_and_keeps_order() {
        let mut server = mockito::Server::new_async().await;
        let _found = server
            .mock("GET", "/api/now/table/item_option_new_set")
            .match_query(Matcher::Regex("sysparm_query=title%3DNetwork".into()))
            .with_status(200)
            .with_body(r#"{"result": [{"sys_id": "set1", "title": "Network"}]}"#)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/api/now/table/item_option_new_set")
            .match_query(Matcher::Regex("sysparm_query=title%3DMissing".into()))
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .create_async()
            .await;
        let _vars = server
            .mock("GET", "/api/now/table/item_option_new")
            .match_query(Matcher::UrlEncoded("sysparm_query".into(), "variable_set=set1".into()))
            .with_status(200)
            .with_body(
                json!({"result": [
                    {"sys_id": "v1", "name": "region", "question_text": "Region", "type": "6", "default_value": "us-east-1", "order": "100"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let names = vec!["Missing".to_string(), "Network".to_string()];
        let all_vars = collect_varsets(&client_for(&server), &names).await.unwrap();

        assert_eq!(
            Value::Object(all_vars),
            json!({
                "Network": [
                    {"name": "region", "question_text": "Region", "default_value": "us-east-1", "type": "6"}
                ]
            })
        );
    }
}
