// ============================================================================
// PostgREST Record Store
// ============================================================================
//
// Talks to a Supabase project's REST endpoint ({url}/rest/v1/{collection})
// with the service-role key. Filters map to PostgREST operators
// (`column=eq.value`), ordering to `order=column.asc|desc`.
//
// ============================================================================

use async_trait::async_trait;
use reqwest::{Response, header};
use serde_json::Value;

use super::{Filter, Order, Record, RecordStore, StoreError};

#[derive(Clone)]
pub struct PostgrestStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(http_client: reqwest::Client, supabase_url: &str, api_key: &str) -> Self {
        Self {
            http_client,
            base_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, collection: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}/{}", self.base_url, collection))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn filter_params(filter: &Filter) -> Vec<(String, String)> {
        filter
            .conditions
            .iter()
            .map(|c| (c.column.clone(), format!("{}.{}", c.op.as_str(), c.value)))
            .collect()
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Server {
            status: status.as_u16(),
            body,
        })
    }

    async fn rows(response: Response) -> Result<Vec<Record>, StoreError> {
        let response = Self::check(response).await?;
        let body: Value = response.json().await.map_err(transport)?;
        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            row => Ok(vec![row]),
        }
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn record_id(row: &Record) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn insert(&self, collection: &str, record: Record) -> Result<String, StoreError> {
        let response = self
            .request(reqwest::Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(transport)?;

        let rows = Self::rows(response).await?;
        rows.first().and_then(record_id).ok_or_else(|| StoreError::Server {
            status: 200,
            body: format!("insert into {} returned no id", collection),
        })
    }

    async fn get(&self, collection: &str, filter: &Filter) -> Result<Option<Record>, StoreError> {
        let mut params = Self::filter_params(filter);
        params.push(("select".to_string(), "*".to_string()));
        params.push(("limit".to_string(), "1".to_string()));

        let response = self
            .request(reqwest::Method::GET, collection)
            .query(&params)
            .send()
            .await
            .map_err(transport)?;

        Ok(Self::rows(response).await?.into_iter().next())
    }

    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PATCH, collection)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .header(header::CONTENT_TYPE, "application/json")
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        let mut params = Self::filter_params(filter);
        params.push(("select".to_string(), "*".to_string()));
        if let Some(order) = order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let response = self
            .request(reqwest::Method::GET, collection)
            .query(&params)
            .send()
            .await
            .map_err(transport)?;

        Self::rows(response).await
    }
}
