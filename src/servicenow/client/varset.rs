use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::{ServiceNowClient, LIST_LIMIT, VARIABLE_SET_TABLE, VARIABLE_TABLE};
use crate::servicenow::model::varset::NewVariableSet;
use crate::servicenow::model::{CatalogVariable, VariableSet};
use crate::servicenow::query::{variable_set_by_name, TableQuery};
use crate::servicenow::traits::VariableSetOperations;

#[async_trait]
impl VariableSetOperations for ServiceNowClient {
    async fn find_variable_set(&self, name: &str) -> Result<Option<VariableSet>> {
        debug!("find_variable_set called for: {name}");
        self.base
            .find_one(VARIABLE_SET_TABLE, &variable_set_by_name(name))
            .await
    }

    async fn create_variable_set(&self, name: &str, description: &str) -> Result<VariableSet> {
        debug!("create_variable_set called for: {name}");
        self.base
            .insert(VARIABLE_SET_TABLE, &NewVariableSet::new(name, description))
            .await
    }

    async fn list_variables(&self, variable_set: &str) -> Result<Vec<CatalogVariable>> {
        self.base
            .query_table(
                VARIABLE_TABLE,
                &TableQuery::eq("variable_set", variable_set),
                LIST_LIMIT,
            )
            .await
    }

    async fn find_variable(&self, name: &str, variable_set: &str) -> Result<Option<CatalogVariable>> {
        self.base
            .find_one(
                VARIABLE_TABLE,
                &TableQuery::eq("name", name).and_eq("variable_set", variable_set),
            )
            .await
    }

    async fn create_variable(&self, variable: &CatalogVariable) -> Result<CatalogVariable> {
        self.base.insert(VARIABLE_TABLE, variable).await
    }

    async fn update_variable(&self, sys_id: &str, variable: &CatalogVariable) -> Result<CatalogVariable> {
        self.base.update(VARIABLE_TABLE, sys_id, variable).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_find_variable_set_by_normalized_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/now/table/item_option_new_set")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("internal_name%3Dmy_set".into()),
                Matcher::Regex("title%3DMy(\\+|%20)Set".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"result": [{"sys_id": "set1", "internal_name": "my_set"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let found = client_for(&server)
            .find_variable_set("My Set")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.sys_id, "set1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_variable_filters_by_parent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/now/table/item_option_new")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "sysparm_query".into(),
                    "name=tf_var_region^variable_set=set1".into(),
                ),
                Matcher::UrlEncoded("sysparm_limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"result": []}"#)
            .expect(1)
            .create_async()
            .await;

        let found = client_for(&server)
            .find_variable("tf_var_region", "set1")
            .await
            .unwrap();
        assert!(found.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_variable_set_posts_minimal_attributes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/now/table/item_option_new_set")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "Network",
                "description": "Cloned from Base",
                "active": "true"
            })))
            .with_status(201)
            .with_body(r#"{"result": {"sys_id": "new1", "name": "Network"}}"#)
            .create_async()
            .await;

        let created = client_for(&server)
            .create_variable_set("Network", "Cloned from Base")
            .await
            .unwrap();
        assert_eq!(created.sys_id, "new1");
        mock.assert_async().await;
    }
}
