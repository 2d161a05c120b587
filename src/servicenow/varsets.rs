use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};

use crate::servicenow::model::{CatalogVariable, VariableSet};
use crate::servicenow::traits::VariableSetOperations;
use crate::sync::{upsert_all, BatchReport, UpsertTarget};

/// Return the set called `name`, creating it when the lookup finds nothing.
/// The flag is `true` when this call created it.
pub async fn get_or_create_variable_set<C: VariableSetOperations>(
    client: &C,
    name: &str,
    description: &str,
) -> Result<(VariableSet, bool)> {
    if let Some(existing) = client
        .find_variable_set(name)
        .await
        .with_context(|| format!("Failed to look up variable set '{name}'"))?
    {
        info!("Variable set exists: {name} ({})", existing.sys_id);
        return Ok((existing, false));
    }

    let created = client
        .create_variable_set(name, description)
        .await
        .with_context(|| format!("Failed to create variable set '{name}'"))?;
    info!("Created variable set: {name} ({})", created.sys_id);
    Ok((created, true))
}

/// A requested variable set together with its variables.
#[derive(Debug, Clone)]
pub struct LoadedSet {
    pub requested: String,
    pub set: VariableSet,
    pub variables: Vec<CatalogVariable>,
}

/// Look up each named set in order and list its variables. Sets that cannot
/// be found are skipped with a warning; any HTTP failure is fatal.
pub async fn load_variable_sets<C: VariableSetOperations>(
    client: &C,
    names: &[String],
) -> Result<Vec<LoadedSet>> {
    let mut loaded = Vec::new();

    for name in names {
        let Some(set) = client.find_variable_set(name).await? else {
            warn!("Variable set {name} not found");
            println!("⚠️ Variable set not found: {name}");
            continue;
        };
        println!("✅ Found variable set: {} ({})", set.display_name(), set.sys_id);

        let variables = client
            .list_variables(&set.sys_id)
            .await
            .with_context(|| format!("Failed to list variables of '{name}'"))?;
        loaded.push(LoadedSet {
            requested: name.clone(),
            set,
            variables,
        });
    }

    Ok(loaded)
}

/// The variables of one set, reconciled by `(name, variable_set)`.
pub struct CatalogVariableTarget<'a, C> {
    client: &'a C,
    variable_set: &'a str,
}

impl<'a, C: VariableSetOperations> CatalogVariableTarget<'a, C> {
    pub fn new(client: &'a C, variable_set: &'a str) -> Self {
        Self {
            client,
            variable_set,
        }
    }
}

#[async_trait]
impl<C: VariableSetOperations> UpsertTarget for CatalogVariableTarget<'_, C> {
    type Item = CatalogVariable;
    type Record = CatalogVariable;

    fn name<'b>(&self, item: &'b CatalogVariable) -> &'b str {
        &item.name
    }

    async fn lookup(&self, item: &CatalogVariable) -> Result<Option<CatalogVariable>> {
        self.client.find_variable(&item.name, self.variable_set).await
    }

    fn differs(&self, record: &CatalogVariable, item: &CatalogVariable) -> bool {
        record.differs_from(item)
    }

    async fn create(&self, item: &CatalogVariable) -> Result<()> {
        self.client.create_variable(item).await?;
        Ok(())
    }

    async fn update(&self, record: &CatalogVariable, item: &CatalogVariable) -> Result<()> {
        let sys_id = record
            .sys_id
            .as_deref()
            .context("Existing variable has no sys_id")?;
        self.client.update_variable(sys_id, item).await?;
        Ok(())
    }
}

/// Upsert `variables` into the set `variable_set`, each re-parented there first.
pub async fn sync_variables<C: VariableSetOperations>(
    client: &C,
    variable_set: &str,
    variables: &[CatalogVariable],
) -> BatchReport {
    let desired: Vec<CatalogVariable> = variables
        .iter()
        .map(|v| v.reparented(variable_set))
        .collect();
    upsert_all(&CatalogVariableTarget::new(client, variable_set), &desired).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servicenow::client::test_support::client_for;
    use crate::sync::report::OutcomeKind;
    use crate::sync::Outcome;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_or_create_twice_creates_once() {
        let mut server = mockito::Server::new_async().await;
        let client = client_for(&server);

        let lookup_empty = server
            .mock("GET", "/api/now/table/item_option_new_set")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .expect(1)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/now/table/item_option_new_set")
            .with_status(201)
            .with_body(r#"{"result": {"sys_id": "set1", "name": "Network"}}"#)
            .expect(1)
            .create_async()
            .await;

        let (first, created) = get_or_create_variable_set(&client, "Network", "d")
            .await
            .unwrap();
        assert!(created);
        lookup_empty.assert_async().await;
        lookup_empty.remove_async().await;

        let _lookup_found = server
            .mock("GET", "/api/now/table/item_option_new_set")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": [{"sys_id": "set1", "name": "Network"}]}"#)
            .create_async()
            .await;

        let (second, created) = get_or_create_variable_set(&client, "Network", "d")
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first.sys_id, second.sys_id);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/now/table/item_option_new_set")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("User Not Authenticated")
            .create_async()
            .await;

        let err = get_or_create_variable_set(&client_for(&server), "Network", "d")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("User Not Authenticated"));
    }

    fn variable(name: &str, label: &str) -> CatalogVariable {
        CatalogVariable {
            name: name.to_string(),
            question_text: Some(label.to_string()),
            var_type: Some("6".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_rerun_with_existing_variables_creates_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _lookup = server
            .mock("GET", "/api/now/table/item_option_new")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"result": [{"sys_id": "v1", "name": "region", "question_text": "Region", "type": "6", "default_value": ""}]})
                    .to_string(),
            )
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/now/table/item_option_new")
            .expect(0)
            .create_async()
            .await;
        let update = server
            .mock("PATCH", Matcher::Regex("^/api/now/table/item_option_new/".into()))
            .expect(0)
            .create_async()
            .await;

        let report = sync_variables(&client_for(&server), "set1", &[variable("region", "Region")]).await;
        assert_eq!(report.count(OutcomeKind::Unchanged), 1);
        create.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_changed_label_patches_exactly_that_variable() {
        let mut server = mockito::Server::new_async().await;
        let _lookup = server
            .mock("GET", "/api/now/table/item_option_new")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"result": [{"sys_id": "v1", "name": "region", "question_text": "Region", "type": "6"}]})
                    .to_string(),
            )
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/api/now/table/item_option_new/v1")
            .match_body(Matcher::PartialJson(json!({
                "question_text": "Deployment region",
                "variable_set": "set1"
            })))
            .with_status(200)
            .with_body(r#"{"result": {"sys_id": "v1", "name": "region"}}"#)
            .expect(1)
            .create_async()
            .await;

        let report = sync_variables(
            &client_for(&server),
            "set1",
            &[variable("region", "Deployment region")],
        )
        .await;
        assert_eq!(report.outcome_of("region"), Some(&Outcome::Updated));
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_one_failing_create_does_not_abort_batch() {
        let mut server = mockito::Server::new_async().await;
        let _lookup = server
            .mock("GET", "/api/now/table/item_option_new")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .create_async()
            .await;

        let mut creates = Vec::new();
        for i in 1..=5 {
            let name = format!("v{i}");
            let status = if i == 2 { 500 } else { 201 };
            let mock = server
                .mock("POST", "/api/now/table/item_option_new")
                .match_body(Matcher::PartialJson(json!({ "name": name })))
                .with_status(status)
                .with_body(json!({"result": {"sys_id": format!("id{i}"), "name": name}}).to_string())
                .expect(1)
                .create_async()
                .await;
            creates.push(mock);
        }

        let desired: Vec<_> = (1..=5).map(|i| variable(&format!("v{i}"), "L")).collect();
        let report = sync_variables(&client_for(&server), "set1", &desired).await;

        assert_eq!(report.items.len(), 5);
        assert_eq!(report.count(OutcomeKind::Created), 4);
        assert!(matches!(report.outcome_of("v2"), Some(Outcome::Failed(_))));
        for mock in creates {
            mock.assert_async().await;
        }
    }
}
