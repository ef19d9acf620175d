use std::fmt;

use serde::{Deserialize, Serialize};

use crate::WizardError;

/// A step identifier as sent on the wire: a name, or a number for older clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepId {
    Index(u64),
    Name(String),
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for StepId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<u64> for StepId {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

/// States of a question wizard. `Ask` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Start,
    /// Start over without offering the existing value.
    Restart,
    Ask(usize),
    Propose,
    Refine,
    Finalize,
    Done,
}

impl Step {
    /// Resolves a wire identifier for a wizard whose question steps are keyed by
    /// `question_keys`. A question's key is accepted as an alias for its `ask_<n>`.
    ///
    /// A missing identifier means `start`. `done` is only ever sent back to the client
    /// and is rejected as input.
    pub fn resolve(id: Option<&StepId>, question_keys: &[&str]) -> Result<Self, WizardError> {
        let questions = question_keys.len();
        let invalid = || WizardError::InvalidStep(id.map(ToString::to_string).unwrap_or_default());
        let step = match id {
            None => Self::Start,
            Some(StepId::Index(0)) => Self::Start,
            Some(StepId::Index(n)) => Self::Ask(usize::try_from(*n).map_err(|_| invalid())?),
            Some(StepId::Name(name)) => match name.trim() {
                "" | "start" => Self::Start,
                "restart" => Self::Restart,
                "propose" => Self::Propose,
                "refine" | "refine_existing" => Self::Refine,
                "finalize" => Self::Finalize,
                other => match question_keys.iter().position(|key| *key == other) {
                    Some(position) => Self::Ask(position + 1),
                    None => other
                        .strip_prefix("ask_")
                        .and_then(|n| n.parse::<usize>().ok())
                        .map(Self::Ask)
                        .ok_or_else(invalid)?,
                },
            },
        };
        match step {
            Self::Ask(n) if n == 0 || n > questions => Err(invalid()),
            Self::Done => Err(invalid()),
            step => Ok(step),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Restart => f.write_str("restart"),
            Self::Ask(n) => write!(f, "ask_{n}"),
            Self::Propose => f.write_str("propose"),
            Self::Refine => f.write_str("refine"),
            Self::Finalize => f.write_str("finalize"),
            Self::Done => f.write_str("done"),
        }
    }
}
