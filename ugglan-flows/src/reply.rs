//! The reply contract every wizard answers with.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::WizardState;

pub const ASSISTANT: &str = "assistant";
pub const BENTO_CARD: &str = "bento_card";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: String,
}

impl Button {
    pub fn new(text: impl Into<String>, action: impl Display) -> Self {
        Self {
            text: text.into(),
            action: action.to_string(),
        }
    }
}

/// One entry in the UI description: a chat bubble, a set of buttons, or a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl UiMessage {
    fn empty(role: &str) -> Self {
        Self {
            role: role.to_string(),
            id: None,
            text: None,
            buttons: Vec::new(),
            value: None,
            options: Vec::new(),
            data: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::empty(ASSISTANT)
        }
    }

    /// A row of buttons without text of its own.
    pub fn choices(buttons: Vec<Button>) -> Self {
        Self {
            buttons,
            ..Self::empty(ASSISTANT)
        }
    }

    pub fn card(role: &str, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(role)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// "Persist `field` with `value`". Executed by the caller, never by the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub field: String,
    pub value: String,
}

impl FinalizeAction {
    pub fn save(entity: &str, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action_type: format!("save_{entity}_field"),
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WizardReply {
    pub ok: bool,
    pub ui: Vec<UiMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<FinalizeAction>,
    pub next_step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WizardState>,
}

impl WizardReply {
    pub fn builder(next_step: impl Display) -> ReplyBuilder {
        ReplyBuilder::new(next_step)
    }
}

#[derive(Clone, Debug)]
pub struct ReplyBuilder {
    ui: Vec<UiMessage>,
    data: Option<Value>,
    actions: Vec<FinalizeAction>,
    next_step: String,
    state: Option<WizardState>,
}

impl ReplyBuilder {
    pub fn new(next_step: impl Display) -> Self {
        Self {
            ui: Vec::new(),
            data: None,
            actions: Vec::new(),
            next_step: next_step.to_string(),
            state: None,
        }
    }

    pub fn say(self, text: impl Into<String>) -> Self {
        self.message(UiMessage::assistant(text))
    }

    pub fn message(mut self, message: UiMessage) -> Self {
        self.ui.push(message);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn action(mut self, action: FinalizeAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Empty states are left out of the reply.
    pub fn state(mut self, state: WizardState) -> Self {
        self.state = (!state.is_empty()).then_some(state);
        self
    }

    pub fn build(self) -> WizardReply {
        WizardReply {
            ok: true,
            ui: self.ui,
            data: self.data,
            actions: self.actions,
            next_step: self.next_step,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_parts_are_omitted_from_the_wire() {
        let reply = WizardReply::builder("ask_1")
            .say("Varför?")
            .state(WizardState::new())
            .build();
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "ok": true,
                "ui": [{"role": "assistant", "text": "Varför?"}],
                "next_step": "ask_1"
            })
        );
    }

    #[test]
    fn finalize_action_serializes_type_tag() {
        let action = FinalizeAction::save("program", "purpose", "Y");
        assert_eq!(
            serde_json::to_value(action).unwrap(),
            json!({"type": "save_program_field", "field": "purpose", "value": "Y"})
        );
    }
}
