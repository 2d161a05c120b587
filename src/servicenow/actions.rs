use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};

use crate::servicenow::model::action::{ActionDefinitionPayload, ActionInputPayload};
use crate::servicenow::model::{ActionDefinition, ActionInput, CatalogVariable, FlowInput};
use crate::servicenow::traits::action::InputTarget;
use crate::servicenow::traits::FlowActionOperations;
use crate::sync::{upsert_all, BatchReport, UpsertTarget};

pub const ACTION_CATEGORY: &str = "Custom";

/// Inputs every synced action starts with, ahead of the variable-set inputs.
fn leading_inputs() -> Vec<FlowInput> {
    vec![
        FlowInput::string("sc_req", "Request"),
        FlowInput::string("sc_req_item", "Request Item"),
    ]
}

/// Merge the variables of several sets into one action input schema. Sets are
/// visited in the given order and the first variable with a given name wins.
pub fn build_flow_inputs<'a, I>(sets: I) -> Vec<FlowInput>
where
    I: IntoIterator<Item = &'a [CatalogVariable]>,
{
    let mut inputs = leading_inputs();
    let mut seen: HashSet<String> = inputs.iter().map(|i| i.name.clone()).collect();

    for variables in sets {
        for variable in variables {
            if variable.name.is_empty() || !seen.insert(variable.name.clone()) {
                continue;
            }
            let label = variable
                .question_text
                .as_deref()
                .filter(|q| !q.is_empty())
                .unwrap_or(&variable.name);
            inputs.push(FlowInput::string(&variable.name, label));
        }
    }
    inputs
}

/// Create the action definition titled `name`, or patch it when it exists.
/// Either failure is fatal to the caller.
pub async fn upsert_action_definition<C: FlowActionOperations>(
    client: &C,
    name: &str,
    scope: &str,
) -> Result<ActionDefinition> {
    let payload = ActionDefinitionPayload {
        title: name,
        name,
        scope,
        category: ACTION_CATEGORY,
        active: true,
    };

    let definition = match client.find_action_definition(name).await? {
        Some(existing) => {
            println!("🔄 Updating existing Flow Action: {name} ({})", existing.sys_id);
            client
                .update_action_definition(&existing.sys_id, &payload)
                .await
                .with_context(|| format!("Failed to update Flow Action '{name}'"))?
        }
        None => {
            println!("🆕 Creating new Flow Action: {name}");
            client
                .create_action_definition(&payload)
                .await
                .with_context(|| format!("Failed to create Flow Action '{name}'"))?
        }
    };

    println!("✅ Flow Action ready: {name} ({})", definition.sys_id);
    Ok(definition)
}

/// Attach inputs to the latest snapshot, falling back to the definition
/// itself when the action has never been published.
pub async fn resolve_input_target<C: FlowActionOperations>(
    client: &C,
    definition: &str,
) -> Result<InputTarget> {
    match client.latest_snapshot(definition).await? {
        Some(snapshot) => {
            info!("Latest snapshot of {definition}: {}", snapshot.sys_id);
            Ok(InputTarget::Snapshot {
                definition: definition.to_string(),
                snapshot: snapshot.sys_id,
            })
        }
        None => {
            warn!("No snapshot found for action {definition}");
            println!("⚠️ No snapshot found; Flow Designer may not have published this action yet.");
            println!("Creating inputs on definition only (will not appear in UI until republished).");
            Ok(InputTarget::Definition(definition.to_string()))
        }
    }
}

/// The inputs of one action target, listed once up front.
pub struct ActionInputTarget<'a, C> {
    client: &'a C,
    target: &'a InputTarget,
    existing: HashMap<String, ActionInput>,
}

impl<'a, C: FlowActionOperations> ActionInputTarget<'a, C> {
    pub async fn load(client: &'a C, target: &'a InputTarget) -> Result<Self> {
        let existing = client
            .list_action_inputs(target)
            .await
            .context("Failed to list existing action inputs")?
            .into_iter()
            .map(|input| (input.name.clone(), input))
            .collect();
        Ok(Self {
            client,
            target,
            existing,
        })
    }

    fn payload<'b>(&'b self, input: &'b FlowInput) -> ActionInputPayload<'b> {
        ActionInputPayload {
            sys_hub_action_type_definition: self.target.definition(),
            sys_hub_action_type_snapshot: self.target.snapshot(),
            name: &input.name,
            label: &input.label,
            input_type: &input.input_type,
            mandatory: input.mandatory.to_string(),
        }
    }
}

#[async_trait]
impl<C: FlowActionOperations> UpsertTarget for ActionInputTarget<'_, C> {
    type Item = FlowInput;
    type Record = ActionInput;

    fn name<'b>(&self, item: &'b FlowInput) -> &'b str {
        &item.name
    }

    async fn lookup(&self, item: &FlowInput) -> Result<Option<ActionInput>> {
        Ok(self.existing.get(&item.name).cloned())
    }

    fn differs(&self, record: &ActionInput, item: &FlowInput) -> bool {
        record.differs_from(item)
    }

    async fn create(&self, item: &FlowInput) -> Result<()> {
        self.client.create_action_input(&self.payload(item)).await?;
        Ok(())
    }

    async fn update(&self, record: &ActionInput, item: &FlowInput) -> Result<()> {
        self.client
            .update_action_input(&record.sys_id, &self.payload(item))
            .await?;
        Ok(())
    }
}

pub async fn sync_action_inputs<C: FlowActionOperations>(
    client: &C,
    target: &InputTarget,
    inputs: &[FlowInput],
) -> Result<BatchReport> {
    let store = ActionInputTarget::load(client, target).await?;
    let report = upsert_all(&store, inputs).await;

    match target.snapshot() {
        Some(snapshot) => println!("📸 Inputs linked to snapshot: {snapshot}"),
        None => println!("⚠️ Inputs linked only to definition (not visible in UI until snapshot exists)."),
    }
    Ok(report)
}
