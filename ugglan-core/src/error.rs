use std::time::Duration;

use thiserror::Error;

/// Failures shared by the prompt, provider and output-parsing layers.
#[derive(Debug, Error)]
pub enum UgglanError {
    #[error("completion provider failed: {0}")]
    LlmProvider(String),
    #[error("could not parse model output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("prompt error: {0}")]
    Prompt(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
