use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::guard::normalize_phrases;

pub const LAST_PROPOSAL: &str = "last_proposal";
pub const MUST_INCLUDE: &str = "must_include";
pub const EXISTING_VALUE: &str = "existing_value";
pub const FIELD: &str = "field";

/// Answers accumulated across steps, round-tripped wholesale by the client.
///
/// Handlers never mutate the state they were given: every update consumes the value and
/// returns a new one. Keys the wizard does not know about are carried forward untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WizardState(Map<String, Value>);

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Trimmed string value, `None` when absent, not a string, or blank.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        non_blank(self.0.get(key))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub fn last_proposal(&self) -> Option<&str> {
        self.get_str(LAST_PROPOSAL)
    }

    /// Phrases that every accepted proposal must contain verbatim.
    ///
    /// Accepts either a list of strings or a single string, which is one phrase.
    pub fn must_include(&self) -> Vec<String> {
        match self.0.get(MUST_INCLUDE) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(text)) => normalize_phrases([text]),
            _ => Vec::new(),
        }
    }

    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Read-only data supplied by the caller: existing saved values, record identifiers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepContext(Map<String, Value>);

impl StepContext {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        non_blank(self.0.get(key))
    }

    /// Identifier-like values, which clients send as either strings or numbers.
    pub fn get_id(&self, key: &str) -> Option<String> {
        id_value(self.0.get(key))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }
}

impl From<Map<String, Value>> for StepContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Map<String, Value>> for WizardState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) fn id_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        other => non_blank(Some(other)).map(str::to_string),
    }
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `null` and absent both mean "empty bag".
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn updates_return_a_new_state_and_keep_unknown_keys() {
        let state: WizardState =
            serde_json::from_value(json!({"why1": "lära", "client_marker": 7})).unwrap();
        let before = state.clone();
        let next = state.with(LAST_PROPOSAL, "Förslag");

        assert_eq!(before.get_str(LAST_PROPOSAL), None);
        assert_eq!(next.last_proposal(), Some("Förslag"));
        assert_eq!(next.get("client_marker"), Some(&json!(7)));
    }

    #[test]
    fn blank_strings_read_as_absent() {
        let state = WizardState::new().with("why1", "   ");
        assert_eq!(state.get_str("why1"), None);
    }

    #[test]
    fn must_include_accepts_list_or_text() {
        let listed = WizardState::new().with(MUST_INCLUDE, json!(["A", "B"]));
        assert_eq!(listed.must_include(), vec!["A", "B"]);

        let text = WizardState::new().with(MUST_INCLUDE, "Stockholm, Sverige\n");
        assert_eq!(text.must_include(), vec!["Stockholm, Sverige"]);
    }

    #[test]
    fn context_ids_accept_numbers() {
        let context: StepContext = serde_json::from_value(json!({"event_id": 12})).unwrap();
        assert_eq!(context.get_id("event_id").as_deref(), Some("12"));
    }
}
