use std::fmt;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Query, StoreError};

#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl PostgrestClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, StoreError> {
        if api_key.trim().is_empty() {
            return Err(StoreError::Config("api_key cannot be empty".to_string()));
        }

        reqwest::Url::parse(&base_url)
            .map_err(|err| StoreError::Config(format!("invalid base_url: {err}")))?;

        Ok(Self {
            http: Client::new(),
            base_url,
            api_key,
        })
    }

    pub async fn select<T>(&self, table: &str, query: &Query) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table);
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .query(query.params())
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Vec<T>>()
                .await
                .map_err(|err| StoreError::Malformed(err.to_string()));
        }

        let body: Value = response
            .json::<Value>()
            .await
            .unwrap_or_else(|_| Value::String(String::new()));
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .unwrap_or("unknown datastore error")
            .to_string();

        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Selects exactly one row; zero rows is `NotFound`.
    pub async fn select_one<T>(
        &self,
        table: &str,
        query: Query,
        key: &str,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let rows = self.select::<T>(table, &query.limit(1)).await?;
        rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
            table: table.to_string(),
            key: key.to_string(),
        })
    }
}
