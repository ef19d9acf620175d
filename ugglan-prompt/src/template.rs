use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use ugglan_core::{UgglanError, Value};

pub type PromptVars = HashMap<String, Value>;

fn placeholder_pattern() -> Result<&'static Regex, UgglanError> {
    static PATTERN: OnceLock<Result<Regex, String>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| UgglanError::Prompt(e.clone()))
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitutes `{{name}}` placeholders. Missing variables render as empty text and
    /// string values are inserted without JSON quoting.
    pub fn render(&self, vars: &PromptVars) -> Result<String, UgglanError> {
        let pattern = placeholder_pattern()?;
        let rendered = pattern.replace_all(&self.template, |caps: &regex::Captures| {
            let key = &caps[1];
            match vars.get(key) {
                Some(Value::Null) | None => String::new(),
                Some(value) => value
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| value.to_string()),
            }
        });
        Ok(rendered.trim().to_string())
    }
}
