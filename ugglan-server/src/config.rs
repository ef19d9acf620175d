use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("could not build {client}: {reason}")]
    Client { client: &'static str, reason: String },
}

/// Process configuration, read from the environment (after `.env` is loaded).
pub struct ServerConfig {
    pub openai_api_key: Secret<String>,
    pub openai_base_url: String,
    pub model: String,
    pub llm_timeout: Duration,
    pub supabase_url: String,
    pub supabase_key: Secret<String>,
    pub bind: IpAddr,
    pub port: u16,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("llm_timeout", &self.llm_timeout)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads every setting through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let llm_timeout = match get("UGGLAN_LLM_TIMEOUT_SECS") {
            Some(raw) => parse::<u64>("UGGLAN_LLM_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };
        if llm_timeout == 0 {
            return Err(ConfigError::Invalid {
                var: "UGGLAN_LLM_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        let bind = match get("UGGLAN_BIND") {
            Some(raw) => parse::<IpAddr>("UGGLAN_BIND", &raw)?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = match get("PORT") {
            Some(raw) => parse::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key: Secret::new(required("OPENAI_API_KEY")?),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: get("UGGLAN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout: Duration::from_secs(llm_timeout),
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: Secret::new(required("SUPABASE_SERVICE_ROLE_KEY")?),
            bind,
            port,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub(crate) fn openai_api_key(&self) -> &str {
        self.openai_api_key.expose_secret()
    }

    pub(crate) fn supabase_key(&self) -> &str {
        self.supabase_key.expose_secret()
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
