use serde::{Deserialize, Serialize};

use crate::state::null_as_default;
use crate::{StepContext, StepId, WizardState};

/// One call of a client-driven wizard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardRequest {
    #[serde(default)]
    pub step: Option<StepId>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: WizardState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: StepContext,
}

impl WizardRequest {
    pub fn at(step: impl Into<StepId>) -> Self {
        Self {
            step: Some(step.into()),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_state(mut self, state: WizardState) -> Self {
        self.state = state;
        self
    }

    pub fn with_context(mut self, context: StepContext) -> Self {
        self.context = context;
        self
    }

    /// Trimmed user input; whitespace-only input counts as absent.
    pub fn input(&self) -> Option<&str> {
        self.input
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
