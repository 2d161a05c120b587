use anyhow::Result;
use async_trait::async_trait;

use crate::servicenow::model::action::{ActionDefinitionPayload, ActionInputPayload};
use crate::servicenow::model::{ActionDefinition, ActionInput, Snapshot};

/// Where the inputs of an action are attached: its latest snapshot when one
/// exists, otherwise the bare definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    Snapshot { definition: String, snapshot: String },
    Definition(String),
}

impl InputTarget {
    pub fn definition(&self) -> &str {
        match self {
            InputTarget::Snapshot { definition, .. } | InputTarget::Definition(definition) => {
                definition
            }
        }
    }

    pub fn snapshot(&self) -> Option<&str> {
        match self {
            InputTarget::Snapshot { snapshot, .. } => Some(snapshot),
            InputTarget::Definition(_) => None,
        }
    }
}

/// Flow Designer actions, their snapshots and inputs.
#[async_trait]
pub trait FlowActionOperations: Send + Sync {
    async fn create_flow_action(&self, body: &serde_json::Value) -> Result<serde_json::Value>;
    async fn find_action_definition(&self, title: &str) -> Result<Option<ActionDefinition>>;
    async fn create_action_definition(
        &self,
        payload: &ActionDefinitionPayload<'_>,
    ) -> Result<ActionDefinition>;
    async fn update_action_definition(
        &self,
        sys_id: &str,
        payload: &ActionDefinitionPayload<'_>,
    ) -> Result<ActionDefinition>;
    /// Most recently created snapshot of the definition, if any.
    async fn latest_snapshot(&self, definition: &str) -> Result<Option<Snapshot>>;
    async fn list_action_inputs(&self, target: &InputTarget) -> Result<Vec<ActionInput>>;
    async fn create_action_input(&self, payload: &ActionInputPayload<'_>) -> Result<ActionInput>;
    async fn update_action_input(
        &self,
        sys_id: &str,
        payload: &ActionInputPayload<'_>,
    ) -> Result<ActionInput>;
}
