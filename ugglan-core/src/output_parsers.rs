use crate::{LlmResponse, Runnable, UgglanError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Removes a surrounding markdown code block (```` ```json ```` or bare ```` ``` ````).
pub fn strip_code_fences(input: &str) -> &str {
    let cleaned = input.trim();
    if cleaned.starts_with("```json") {
        cleaned
            .trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
    } else if cleaned.starts_with("```") {
        cleaned
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        cleaned
    }
}

/// Parses model output into a typed value. Deserializing into `T` doubles as the
/// shape check: a mismatch is reported as `ParseFailed` with the offending text.
#[derive(Clone, Default)]
pub struct JsonOutputParser<T = Value> {
    _marker: PhantomData<T>,
}

impl<T> JsonOutputParser<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> JsonOutputParser<T> {
    pub fn parse(&self, input: &str) -> Result<T, UgglanError> {
        let cleaned = strip_code_fences(input);
        if cleaned.is_empty() {
            return Err(UgglanError::ParseFailed {
                output: String::new(),
                reason: "empty output".to_string(),
            });
        }

        serde_json::from_str(cleaned).map_err(|err| UgglanError::ParseFailed {
            output: cleaned.to_string(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + Sync + 'static> Runnable<String, T> for JsonOutputParser<T> {
    async fn invoke(&self, input: String) -> Result<T, UgglanError> {
        self.parse(&input)
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + Sync + 'static> Runnable<LlmResponse, T>
    for JsonOutputParser<T>
{
    async fn invoke(&self, input: LlmResponse) -> Result<T, UgglanError> {
        self.parse(&input.content)
    }
}
