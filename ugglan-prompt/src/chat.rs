use crate::{PromptTemplate, PromptVars};
use ugglan_core::{Message, Role, UgglanError};

#[derive(Debug, Clone)]
pub enum MessagePromptTemplate {
    Human(PromptTemplate),
    System(PromptTemplate),
    Placeholder { variable_name: String },
}

impl MessagePromptTemplate {
    pub fn human(template: &str) -> Self {
        Self::Human(PromptTemplate::new(template))
    }

    pub fn system(template: &str) -> Self {
        Self::System(PromptTemplate::new(template))
    }

    pub fn placeholder(variable_name: &str) -> Self {
        Self::Placeholder {
            variable_name: variable_name.to_string(),
        }
    }

    pub fn format(&self, vars: &PromptVars) -> Result<Vec<Message>, UgglanError> {
        let (role, template) = match self {
            MessagePromptTemplate::Human(t) => (Role::User, t),
            MessagePromptTemplate::System(t) => (Role::System, t),
            MessagePromptTemplate::Placeholder { variable_name } => {
                let Some(value) = vars.get(variable_name) else {
                    return Ok(vec![]);
                };
                if value.is_null() {
                    return Ok(vec![]);
                }
                if let Ok(msgs) = serde_json::from_value::<Vec<Message>>(value.clone()) {
                    return Ok(msgs);
                }
                if let Ok(msg) = serde_json::from_value::<Message>(value.clone()) {
                    return Ok(vec![msg]);
                }
                return Err(UgglanError::Prompt(format!(
                    "placeholder '{variable_name}' does not hold chat messages"
                )));
            }
        };
        Ok(vec![Message {
            role,
            content: template.render(vars)?,
        }])
    }
}

#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    messages: Vec<MessagePromptTemplate>,
}

impl ChatPromptTemplate {
    pub fn new(messages: Vec<MessagePromptTemplate>) -> Self {
        Self { messages }
    }

    pub fn format_messages(&self, vars: &PromptVars) -> Result<Vec<Message>, UgglanError> {
        let mut result = Vec::new();
        for tmpl in &self.messages {
            result.extend(tmpl.format(vars)?);
        }
        Ok(result)
    }
}
