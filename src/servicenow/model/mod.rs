pub mod action;
pub mod variable;
pub mod varset;

use serde::Deserialize;

pub use action::{ActionDefinition, ActionInput, FlowInput, Snapshot};
pub use variable::CatalogVariable;
pub use varset::VariableSet;

/// Table API responses wrap every payload in `{"result": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TableResponse<T> {
    pub result: T,
}
