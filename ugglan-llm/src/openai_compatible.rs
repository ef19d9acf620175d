//! Generic OpenAI-compatible LLM client
//!
//! Supports any provider using OpenAI's chat-completions format (OpenAI, Azure proxies,
//! DeepSeek, Together, local gateways).

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use url::Url;

use ugglan_core::{LlmRequest, LlmResponse, Message, ResponseFormat, Runnable, UgglanError};

/// Request body for chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormatBody>,
    pub stream: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseFormatBody {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Non-streaming response from chat completions
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiError {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    base_url: String,
    api_key: Secret<String>,
    default_model: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::default()
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// A request that ran out of time is a timeout, not a provider failure.
    fn transport_error(&self, err: reqwest::Error) -> UgglanError {
        if err.is_timeout() {
            UgglanError::Timeout(self.timeout)
        } else {
            UgglanError::LlmProvider(err.to_string())
        }
    }

    fn to_wire(&self, request: LlmRequest) -> ChatCompletionRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };
        let response_format = match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(ResponseFormatBody {
                format_type: "json_object".to_string(),
            }),
        };
        ChatCompletionRequest {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: None,
            response_format,
            stream: false,
        }
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for OpenAiCompatibleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, UgglanError> {
        let body = self.to_wire(input);
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&text)
                .map(|err| err.error.message)
                .unwrap_or(text);
            return Err(UgglanError::LlmProvider(format!(
                "status {}: {message}",
                status.as_u16()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| self.transport_error(err))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UgglanError::LlmProvider("no choices returned".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
        })
    }
}

pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<Secret<String>>,
    default_model: Option<String>,
    timeout: Duration,
}

impl Default for OpenAiCompatibleBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            default_model: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiCompatibleBuilder {
    pub fn base_url(mut self, value: &str) -> Result<Self, UgglanError> {
        let url = Url::parse(value)
            .map_err(|err| UgglanError::InvalidConfig(format!("invalid base_url: {err}")))?;
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(value.into()));
        self
    }

    pub fn default_model(mut self, value: impl Into<String>) -> Self {
        self.default_model = Some(value.into());
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, UgglanError> {
        let base_url = self
            .base_url
            .ok_or_else(|| UgglanError::InvalidConfig("base_url is required".to_string()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| UgglanError::InvalidConfig("api_key is required".to_string()))?;
        if api_key.expose_secret().trim().is_empty() {
            return Err(UgglanError::InvalidConfig(
                "api_key cannot be empty".to_string(),
            ));
        }
        let default_model = self
            .default_model
            .ok_or_else(|| UgglanError::InvalidConfig("default_model is required".to_string()))?;

        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| UgglanError::InvalidConfig(err.to_string()))?;

        Ok(OpenAiCompatibleClient {
            http,
            base_url: base_url.to_string(),
            api_key,
            default_model,
            timeout: self.timeout,
        })
    }
}
