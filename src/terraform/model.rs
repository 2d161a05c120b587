use serde::{Deserialize, Serialize};

/// JSON:API documents wrap every resource in `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub attributes: WorkspaceAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceAttributes {
    #[serde(default)]
    pub name: String,
}

/// A variable as returned by the API. Values of sensitive variables are
/// never returned, so `value` is `None` for them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Var {
    pub id: String,
    pub attributes: VarAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarAttributes {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub hcl: bool,
    #[serde(default)]
    pub sensitive: bool,
}

fn default_category() -> String {
    "terraform".to_string()
}

/// The owner a variable is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarParent {
    Workspace(String),
    Varset(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    pub data: ResourceRef,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VarRelationships {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Relationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub varset: Option<Relationship>,
}

impl From<&VarParent> for VarRelationships {
    fn from(parent: &VarParent) -> Self {
        match parent {
            VarParent::Workspace(id) => VarRelationships {
                workspace: Some(Relationship {
                    data: ResourceRef {
                        kind: "workspaces",
                        id: id.clone(),
                    },
                }),
                varset: None,
            },
            VarParent::Varset(id) => VarRelationships {
                workspace: None,
                varset: Some(Relationship {
                    data: ResourceRef {
                        kind: "varsets",
                        id: id.clone(),
                    },
                }),
            },
        }
    }
}

/// Body of a create or update request for one variable.
#[derive(Debug, Clone, Serialize)]
pub struct VarResource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: VarAttributes,
    pub relationships: VarRelationships,
}

impl VarResource {
    pub fn new(attributes: VarAttributes, parent: &VarParent) -> Document<Self> {
        Document {
            data: VarResource {
                kind: "vars",
                attributes,
                relationships: parent.into(),
            },
        }
    }
}
