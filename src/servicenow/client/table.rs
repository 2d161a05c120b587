use anyhow::Result;
use log::debug;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::base::BaseClient;
use crate::error::{decode_json, error_for_status};
use crate::servicenow::model::TableResponse;
use crate::servicenow::query::TableQuery;

/// Upper bound used when listing every child of a record.
pub const LIST_LIMIT: u32 = 1000;

fn table_path(table: &str) -> String {
    format!("api/now/table/{table}")
}

impl BaseClient {
    /// `GET /api/now/table/<table>` filtered by `query` and capped at `limit` rows.
    pub async fn query_table<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
        limit: u32,
    ) -> Result<Vec<T>> {
        debug!("query_table called for {table}: {query} (limit {limit})");

        let limit = limit.to_string();
        let response = self
            .base_api(Method::GET, &table_path(table))?
            .query(&[
                ("sysparm_query", query.as_str()),
                ("sysparm_limit", limit.as_str()),
                ("sysparm_exclude_reference_link", "true"),
            ])
            .send()
            .await?;
        let response_text = error_for_status(response).await?.text().await?;

        let rows: TableResponse<Vec<T>> = decode_json(&response_text, table)?;
        debug!("Fetched {} rows from {table}", rows.result.len());
        Ok(rows.result)
    }

    /// First row matching `query`, with the result count capped at one.
    /// Duplicate matches are not detected; the first row returned wins.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<Option<T>> {
        Ok(self.query_table(table, query, 1).await?.into_iter().next())
    }

    /// `POST /api/now/table/<table>` and decode the created record.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!("insert called for {table}");

        let response = self
            .base_api(Method::POST, &table_path(table))?
            .json(body)
            .send()
            .await?;
        let response_text = error_for_status(response).await?.text().await?;

        let created: TableResponse<T> = decode_json(&response_text, table)?;
        Ok(created.result)
    }

    /// `PATCH /api/now/table/<table>/<sys_id>` and decode the updated record.
    pub async fn update<B, T>(&self, table: &str, sys_id: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!("update called for {table}/{sys_id}");

        let response = self
            .base_api(Method::PATCH, &format!("{}/{sys_id}", table_path(table)))?
            .json(body)
            .send()
            .await?;
        let response_text = error_for_status(response).await?.text().await?;

        let updated: TableResponse<T> = decode_json(&response_text, table)?;
        Ok(updated.result)
    }

    /// `POST` to a scripted REST endpoint outside the Table API, returning the raw JSON.
    pub async fn post_api<B>(&self, path: &str, body: &B) -> Result<serde_json::Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self.base_api(Method::POST, path)?.json(body).send().await?;
        let response_text = error_for_status(response).await?.text().await?;
        decode_json(&response_text, path)
    }
}
