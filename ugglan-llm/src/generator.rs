use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use ugglan_core::{JsonOutputParser, LlmRequest, Message, ResponseFormat, UgglanError};

use crate::Llm;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

impl CompletionOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    pub fn json() -> Self {
        Self {
            temperature: None,
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// The only path to the completion provider. Every call is one request: no caching
/// and no retries. Callers that want a second attempt issue it themselves.
#[derive(Clone)]
pub struct TextGenerator {
    llm: Arc<dyn Llm>,
    model: String,
    timeout: Duration,
}

impl TextGenerator {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            model: String::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn generate(&self, system: &str, user: &str) -> Result<String, UgglanError> {
        self.generate_with(
            vec![Message::system(system), Message::user(user)],
            &CompletionOptions::default(),
        )
        .await
    }

    pub async fn generate_with(
        &self,
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> Result<String, UgglanError> {
        let request = LlmRequest {
            model: self.model.clone(),
            messages,
            temperature: options.temperature,
            response_format: options.response_format,
        };
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            json = matches!(options.response_format, ResponseFormat::JsonObject),
            "requesting completion"
        );

        let response = tokio::time::timeout(self.timeout, self.llm.invoke(request))
            .await
            .map_err(|_| UgglanError::Timeout(self.timeout))??;

        Ok(response.content.trim().to_string())
    }

    /// Asks for a JSON object and parses it into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<T, UgglanError> {
        let options = CompletionOptions {
            response_format: ResponseFormat::JsonObject,
            ..options.clone()
        };
        let text = self
            .generate_with(vec![Message::system(system), Message::user(user)], &options)
            .await?;
        JsonOutputParser::<T>::new().parse(&text)
    }
}
