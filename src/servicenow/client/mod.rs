mod action;
pub mod base;
mod table;
mod varset;

use anyhow::Result;

use self::base::BaseClient;
use crate::config::ServiceNowSettings;
use crate::http::build_http_client;
use crate::servicenow::auth::acquire_token;

pub use table::LIST_LIMIT;

pub const VARIABLE_SET_TABLE: &str = "item_option_new_set";
pub const VARIABLE_TABLE: &str = "item_option_new";
pub const ACTION_DEFINITION_TABLE: &str = "sys_hub_action_type_definition";
pub const ACTION_SNAPSHOT_TABLE: &str = "sys_hub_action_type_snapshot";
pub const ACTION_INPUT_TABLE: &str = "sys_hub_action_input";

/// ServiceNow client bound to one instance and one bearer token.
#[derive(Debug, Clone)]
pub struct ServiceNowClient {
    base: BaseClient,
}

impl ServiceNowClient {
    pub fn new(base: BaseClient) -> Self {
        Self { base }
    }

    /// Acquire a token (directly or through the refresh exchange) and build
    /// the client every later call goes through.
    pub async fn connect(settings: &ServiceNowSettings) -> Result<Self> {
        let client = build_http_client(settings.timeout)?;
        let token = acquire_token(&client, &settings.endpoint, settings.credentials.clone()).await?;
        Ok(Self::new(BaseClient::new(
            client,
            settings.endpoint.clone(),
            token.token,
        )))
    }
}
