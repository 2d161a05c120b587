use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use super::client::TfcClient;
use super::definitions::ResolvedVariable;
use super::model::{Var, VarAttributes, VarParent};
use crate::sync::{upsert_all, BatchReport, UpsertTarget};

pub const TERRAFORM_CATEGORY: &str = "terraform";

impl From<&ResolvedVariable> for VarAttributes {
    fn from(variable: &ResolvedVariable) -> Self {
        VarAttributes {
            key: variable.name().to_string(),
            value: Some(variable.rendered()),
            description: Some(variable.definition.description.clone().unwrap_or_default()),
            category: TERRAFORM_CATEGORY.to_string(),
            hcl: variable.is_hcl(),
            sensitive: variable.definition.sensitive,
        }
    }
}

/// The variables attached to one workspace or variable set, listed once up front.
pub struct TfcVarTarget<'a> {
    client: &'a TfcClient,
    parent: VarParent,
    existing: HashMap<String, Var>,
    overwrite: bool,
}

impl<'a> TfcVarTarget<'a> {
    pub fn new(client: &'a TfcClient, parent: VarParent, existing: Vec<Var>, overwrite: bool) -> Self {
        let existing = existing
            .into_iter()
            .map(|var| (var.attributes.key.clone(), var))
            .collect();
        Self {
            client,
            parent,
            existing,
            overwrite,
        }
    }

    pub async fn load(client: &'a TfcClient, parent: VarParent, overwrite: bool) -> Result<Self> {
        let existing = client.list_vars(&parent).await?;
        Ok(Self::new(client, parent, existing, overwrite))
    }
}

/// Whether `current` has to be patched to match `desired`. The API never
/// returns the value of a sensitive variable, so such values are only
/// rewritten when `overwrite` is set.
pub fn var_differs(current: &VarAttributes, desired: &VarAttributes, overwrite: bool) -> bool {
    let description = |a: &VarAttributes| a.description.clone().unwrap_or_default();
    if description(current) != description(desired)
        || current.sensitive != desired.sensitive
        || current.hcl != desired.hcl
    {
        return true;
    }
    if current.sensitive {
        overwrite
    } else {
        current.value.as_deref().unwrap_or_default() != desired.value.as_deref().unwrap_or_default()
    }
}

#[async_trait]
impl UpsertTarget for TfcVarTarget<'_> {
    type Item = VarAttributes;
    type Record = Var;

    fn name<'b>(&self, item: &'b VarAttributes) -> &'b str {
        &item.key
    }

    async fn lookup(&self, item: &VarAttributes) -> Result<Option<Var>> {
        Ok(self.existing.get(&item.key).cloned())
    }

    fn differs(&self, record: &Var, item: &VarAttributes) -> bool {
        var_differs(&record.attributes, item, self.overwrite)
    }

    async fn create(&self, item: &VarAttributes) -> Result<()> {
        self.client.create_var(item.clone(), &self.parent).await?;
        Ok(())
    }

    async fn update(&self, record: &Var, item: &VarAttributes) -> Result<()> {
        self.client
            .update_var(&record.id, item.clone(), &self.parent)
            .await?;
        Ok(())
    }
}

/// Upsert `vars` into `parent`. Listing the existing variables is fatal;
/// each write after that is recorded in the report.
pub async fn sync_vars(
    client: &TfcClient,
    parent: VarParent,
    vars: &[VarAttributes],
    overwrite: bool,
) -> Result<BatchReport> {
    let target = TfcVarTarget::load(client, parent, overwrite).await?;
    Ok(upsert_all(&target, vars).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::report::OutcomeKind;
    use crate::sync::Outcome;
    use crate::terraform::definitions::VariableDefinition;
    use mockito::Matcher;
    use rstest::rstest;
    use serde_json::json;

    fn attributes(key: &str, value: Option<&str>, sensitive: bool) -> VarAttributes {
        VarAttributes {
            key: key.to_string(),
            value: value.map(str::to_string),
            description: Some(String::new()),
            category: TERRAFORM_CATEGORY.to_string(),
            hcl: false,
            sensitive,
        }
    }

    #[rstest]
    #[case(attributes("a", Some("1"), false), attributes("a", Some("1"), false), false, false)]
    #[case(attributes("a", Some("1"), false), attributes("a", Some("2"), false), false, true)]
    #[case(attributes("a", None, true), attributes("a", Some("2"), true), false, false)]
    #[case(attributes("a", None, true), attributes("a", Some("2"), true), true, true)]
    #[case(attributes("a", Some("1"), false), attributes("a", Some("1"), true), false, true)]
    fn test_var_differs(
        #[case] current: VarAttributes,
        #[case] desired: VarAttributes,
        #[case] overwrite: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(var_differs(&current, &desired, overwrite), expected);
    }

    #[test]
    fn test_attributes_from_resolved_list() {
        let resolved = ResolvedVariable {
            definition: VariableDefinition {
                name: "subnets".to_string(),
                description: None,
                var_type: Some("list(string)".to_string()),
                default: None,
                sensitive: false,
            },
            value: json!(["a", "b"]),
        };
        let attrs = VarAttributes::from(&resolved);
        assert_eq!(attrs.value.as_deref(), Some(r#"["a","b"]"#));
        assert!(attrs.hcl);
        assert_eq!(attrs.description.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_sync_vars_creates_patches_and_skips() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v2/workspaces/ws-1/vars")
            .with_status(200)
            .with_body(
                json!({"data": [
                    {"id": "var-1", "attributes": {"key": "region", "value": "us-east-1", "description": "", "sensitive": false}},
                    {"id": "var-2", "attributes": {"key": "size", "value": "small", "description": "", "sensitive": false}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/api/v2/vars/var-2")
            .match_body(Matcher::PartialJson(json!({"data": {"attributes": {"value": "large"}}})))
            .with_status(200)
            .with_body(r#"{"data": {"id": "var-2", "attributes": {"key": "size"}}}"#)
            .expect(1)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v2/vars")
            .match_body(Matcher::PartialJson(json!({"data": {"attributes": {"key": "zone"}}})))
            .with_status(201)
            .with_body(r#"{"data": {"id": "var-3", "attributes": {"key": "zone"}}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = TfcClient::for_address(&server.url(), "tfc");
        let vars = vec![
            attributes("region", Some("us-east-1"), false),
            attributes("size", Some("large"), false),
            attributes("zone", Some("a"), false),
        ];
        let report = sync_vars(&client, VarParent::Workspace("ws-1".to_string()), &vars, false)
            .await
            .unwrap();

        assert_eq!(report.outcome_of("region"), Some(&Outcome::Unchanged));
        assert_eq!(report.outcome_of("size"), Some(&Outcome::Updated));
        assert_eq!(report.outcome_of("zone"), Some(&Outcome::Created));
        assert_eq!(report.count(OutcomeKind::Failed), 0);
        patch.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v2/workspaces/ws-1/vars")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = TfcClient::for_address(&server.url(), "tfc");
        let result = sync_vars(&client, VarParent::Workspace("ws-1".to_string()), &[], false).await;
        assert!(result.is_err());
    }
}
