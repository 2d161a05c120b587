use anyhow::Result;
use async_trait::async_trait;

use crate::servicenow::model::{CatalogVariable, VariableSet};

/// Catalog variable sets and the variables scoped to them.
#[async_trait]
pub trait VariableSetOperations: Send + Sync {
    /// Look up a set by any of its name fields, capped at one result.
    async fn find_variable_set(&self, name: &str) -> Result<Option<VariableSet>>;
    async fn create_variable_set(&self, name: &str, description: &str) -> Result<VariableSet>;
    async fn list_variables(&self, variable_set: &str) -> Result<Vec<CatalogVariable>>;
    /// Look up one variable by `(name, variable_set)`, capped at one result.
    async fn find_variable(&self, name: &str, variable_set: &str) -> Result<Option<CatalogVariable>>;
    async fn create_variable(&self, variable: &CatalogVariable) -> Result<CatalogVariable>;
    async fn update_variable(&self, sys_id: &str, variable: &CatalogVariable) -> Result<CatalogVariable>;
}
