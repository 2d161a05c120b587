use serde::{Deserialize, Serialize};

use super::variable::same_value;

/// A Flow Designer action definition (`sys_hub_action_type_definition`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub sys_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionDefinitionPayload<'a> {
    pub title: &'a str,
    pub name: &'a str,
    pub scope: &'a str,
    pub category: &'a str,
    pub active: bool,
}

/// A published version of an action (`sys_hub_action_type_snapshot`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sys_id: String,
}

/// An input record of an action (`sys_hub_action_input`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub sys_id: String,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub mandatory: Option<String>,
}

impl ActionInput {
    pub fn differs_from(&self, desired: &FlowInput) -> bool {
        !same_value(self.label.as_deref(), Some(desired.label.as_str()))
            || !same_value(self.input_type.as_deref(), Some(desired.input_type.as_str()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionInputPayload<'a> {
    pub sys_hub_action_type_definition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys_hub_action_type_snapshot: Option<&'a str>,
    pub name: &'a str,
    pub label: &'a str,
    #[serde(rename = "type")]
    pub input_type: &'a str,
    pub mandatory: String,
}

/// The input schema of an action, as built from variable sets and as
/// accepted by the `sn_fd/action` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInput {
    pub label: String,
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub mandatory: bool,
}

impl FlowInput {
    pub fn string(name: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            input_type: "String".to_string(),
            mandatory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFlowAction<'a> {
    pub name: &'a str,
    pub scope: &'a str,
    pub category: &'a str,
    pub inputs: &'a serde_json::Value,
    pub active: bool,
}
