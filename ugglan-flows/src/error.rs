use std::time::Duration;

use thiserror::Error;
use ugglan_core::UgglanError;
use ugglan_store::StoreError;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Missing field context ({0})")]
    MissingField(String),
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Invalid step: {0}")]
    InvalidStep(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),
    #[error("Datastore error: {0}")]
    Store(String),
}

impl WizardError {
    pub fn missing_input(what: impl Into<String>) -> Self {
        Self::MissingInput(what.into())
    }

    /// HTTP status the transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_)
            | Self::MissingInput(_)
            | Self::InvalidStep(_)
            | Self::InvalidRequest(_) => 400,
            Self::GenerationTimeout(_) => 504,
            Self::GenerationFailed(_) | Self::Store(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<UgglanError> for WizardError {
    fn from(error: UgglanError) -> Self {
        match error {
            UgglanError::Timeout(after) => Self::GenerationTimeout(after),
            other => Self::GenerationFailed(other.to_string()),
        }
    }
}

impl From<StoreError> for WizardError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::InvalidRequest(error.to_string()),
            other => Self::Store(other.to_string()),
        }
    }
}
