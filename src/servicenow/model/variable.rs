use serde::{Deserialize, Serialize};

/// Variable type codes of the `item_option_new` table.
pub const TYPE_MULTI_LINE_TEXT: &str = "2";
pub const TYPE_SINGLE_LINE_TEXT: &str = "6";
pub const TYPE_CHECKBOX: &str = "7";

/// A catalog variable (`item_option_new`). Used both as the decoded table
/// record and as the create/update payload; unset attributes are omitted
/// from the payload instead of being sent as null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVariable {
    #[serde(default, skip_serializing)]
    pub sys_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_set: Option<String>,
}

/// Compares two optional table values, treating an empty string like an
/// unset field because the Table API returns `""` for empty columns.
pub fn same_value(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or_default() == b.unwrap_or_default()
}

impl CatalogVariable {
    /// A copy of this variable re-parented under `variable_set`, as the
    /// payload that recreates it there. The label falls back to the name and
    /// the type to single line text.
    pub fn reparented(&self, variable_set: &str) -> Self {
        Self {
            sys_id: None,
            question_text: self
                .question_text
                .clone()
                .or_else(|| Some(self.name.clone())),
            var_type: self
                .var_type
                .clone()
                .or_else(|| Some(TYPE_SINGLE_LINE_TEXT.to_string())),
            variable_set: Some(variable_set.to_string()),
            ..self.clone()
        }
    }

    /// The attributes an upsert keeps in sync on an existing record.
    pub fn differs_from(&self, desired: &CatalogVariable) -> bool {
        !same_value(self.question_text.as_deref(), desired.question_text.as_deref())
            || !same_value(self.var_type.as_deref(), desired.var_type.as_deref())
            || !same_value(self.default_value.as_deref(), desired.default_value.as_deref())
    }
}

/// Exported shape of a variable, as printed by `get-varsets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSummary {
    pub name: String,
    pub question_text: Option<String>,
    pub default_value: Option<String>,
    #[serde(rename = "type")]
    pub var_type: Option<String>,
}

impl From<&CatalogVariable> for VariableSummary {
    fn from(v: &CatalogVariable) -> Self {
        VariableSummary {
            name: v.name.clone(),
            question_text: v.question_text.clone(),
            default_value: v.default_value.clone(),
            var_type: v.var_type.clone(),
        }
    }
}
