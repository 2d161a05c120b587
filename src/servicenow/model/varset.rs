use serde::{Deserialize, Serialize};

/// A catalog variable set (`item_option_new_set`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSet {
    pub sys_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sys_name: Option<String>,
    #[serde(default)]
    pub internal_name: Option<String>,
}

impl VariableSet {
    pub fn display_name(&self) -> &str {
        [&self.title, &self.sys_name, &self.name, &self.internal_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(&self.sys_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVariableSet<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub active: &'static str,
}

impl<'a> NewVariableSet<'a> {
    pub fn new(name: &'a str, description: &'a str) -> Self {
        Self {
            name,
            description,
            active: "true",
        }
    }
}
