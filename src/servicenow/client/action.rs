use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::{
    ServiceNowClient, ACTION_DEFINITION_TABLE, ACTION_INPUT_TABLE, ACTION_SNAPSHOT_TABLE,
    LIST_LIMIT,
};
use crate::servicenow::model::action::{ActionDefinitionPayload, ActionInputPayload};
use crate::servicenow::model::{ActionDefinition, ActionInput, Snapshot};
use crate::servicenow::query::TableQuery;
use crate::servicenow::traits::action::InputTarget;
use crate::servicenow::traits::FlowActionOperations;

const FLOW_ACTION_API: &str = "api/sn_fd/action";

#[async_trait]
impl FlowActionOperations for ServiceNowClient {
    async fn create_flow_action(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        debug!("create_flow_action called");
        self.base.post_api(FLOW_ACTION_API, body).await
    }

    async fn find_action_definition(&self, title: &str) -> Result<Option<ActionDefinition>> {
        self.base
            .find_one(ACTION_DEFINITION_TABLE, &TableQuery::eq("title", title))
            .await
    }

    async fn create_action_definition(
        &self,
        payload: &ActionDefinitionPayload<'_>,
    ) -> Result<ActionDefinition> {
        self.base.insert(ACTION_DEFINITION_TABLE, payload).await
    }

    async fn update_action_definition(
        &self,
        sys_id: &str,
        payload: &ActionDefinitionPayload<'_>,
    ) -> Result<ActionDefinition> {
        self.base
            .update(ACTION_DEFINITION_TABLE, sys_id, payload)
            .await
    }

    async fn latest_snapshot(&self, definition: &str) -> Result<Option<Snapshot>> {
        let query = TableQuery::eq(ACTION_DEFINITION_TABLE, definition).order_by_desc("sys_created_on");
        self.base.find_one(ACTION_SNAPSHOT_TABLE, &query).await
    }

    async fn list_action_inputs(&self, target: &InputTarget) -> Result<Vec<ActionInput>> {
        let query = match target {
            InputTarget::Snapshot { snapshot, .. } => TableQuery::eq(ACTION_SNAPSHOT_TABLE, snapshot),
            InputTarget::Definition(definition) => TableQuery::eq(ACTION_DEFINITION_TABLE, definition),
        };
        self.base
            .query_table(ACTION_INPUT_TABLE, &query, LIST_LIMIT)
            .await
    }

    async fn create_action_input(&self, payload: &ActionInputPayload<'_>) -> Result<ActionInput> {
        self.base.insert(ACTION_INPUT_TABLE, payload).await
    }

    async fn update_action_input(
        &self,
        sys_id: &str,
        payload: &ActionInputPayload<'_>,
    ) -> Result<ActionInput> {
        self.base.update(ACTION_INPUT_TABLE, sys_id, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_latest_snapshot_orders_by_creation_desc() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/now/table/sys_hub_action_type_snapshot")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "sysparm_query".into(),
                    "sys_hub_action_type_definition=def1^ORDERBYDESCsys_created_on".into(),
                ),
                Matcher::UrlEncoded("sysparm_limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"result": [{"sys_id": "snap9"}]}"#)
            .create_async()
            .await;

        let snapshot = client_for(&server).latest_snapshot("def1").await.unwrap();
        assert_eq!(snapshot.unwrap().sys_id, "snap9");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_inputs_by_definition_when_unpublished() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/now/table/sys_hub_action_input")
            .match_query(Matcher::UrlEncoded(
                "sysparm_query".into(),
                "sys_hub_action_type_definition=def1".into(),
            ))
            .with_status(200)
            .with_body(r#"{"result": [{"sys_id": "in1", "name": "sc_req", "label": "Request", "type": "String"}]}"#)
            .create_async()
            .await;

        let inputs = client_for(&server)
            .list_action_inputs(&InputTarget::Definition("def1".to_string()))
            .await
            .unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "sc_req");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_flow_action_posts_to_designer_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/sn_fd/action")
            .match_body(Matcher::PartialJson(serde_json::json!({"name": "Provision"})))
            .with_status(201)
            .with_body(r#"{"sys_id": "act1"}"#)
            .create_async()
            .await;

        let created = client_for(&server)
            .create_flow_action(&serde_json::json!({"name": "Provision", "inputs": []}))
            .await
            .unwrap();
        assert_eq!(created["sys_id"], "act1");
        mock.assert_async().await;
    }
}
