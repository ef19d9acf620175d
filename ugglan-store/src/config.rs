use std::fmt;

use crate::client::PostgrestClient;
use crate::store::SupabaseStore;
use crate::StoreError;

#[derive(Default, Clone)]
pub struct SupabaseStoreBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    bento_limit: Option<usize>,
}

impl fmt::Debug for SupabaseStoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("SupabaseStoreBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &api_key)
            .field("bento_limit", &self.bento_limit)
            .finish()
    }
}

impl SupabaseStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(value.into());
        self
    }

    pub fn bento_limit(mut self, value: usize) -> Self {
        self.bento_limit = Some(value);
        self
    }

    pub fn base_url_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self.base_url = Some(value);
        }
        self
    }

    pub fn api_key_from_env(mut self, var_name: &str) -> Self {
        if let Ok(value) = std::env::var(var_name) {
            self.api_key = Some(value);
        }
        self
    }

    pub fn build(self) -> Result<SupabaseStore, StoreError> {
        let base_url = self
            .base_url
            .ok_or_else(|| StoreError::Config("base_url is required".to_string()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| StoreError::Config("api_key is required".to_string()))?;
        let bento_limit = self.bento_limit.unwrap_or(30);
        if bento_limit == 0 {
            return Err(StoreError::Config(
                "bento_limit must be greater than 0".to_string(),
            ));
        }

        let client = PostgrestClient::new(base_url, api_key)?;
        Ok(SupabaseStore::new(client, bento_limit))
    }
}
