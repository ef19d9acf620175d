//! "Ugglan", the free-form chat assistant, and the tips search it draws on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{warn, Instrument};
use ugglan_core::{Message, Role};
use ugglan_llm::{CompletionOptions, TextGenerator};
use ugglan_prompt::{ChatPromptTemplate, MessagePromptTemplate, PromptVars};
use ugglan_store::{search_needle, EventStore, Tip};

use crate::prompts::{HOPA, UGGLAN};
use crate::WizardError;

pub const TIPS_LIMIT: usize = 5;

const FALLBACK_REPLY: &str = "Ho-ho-hooray, hur kan jag hjälpa dig?";
const NO_TIPS: &str = "Inga relevanta interna tips hittades.";

const SYSTEM: &str = "{{persona}}\n\
- Svara alltid på svenska, kortfattat, vänligt och praktiskt.\n\
- Använd enkelt, vardagligt språk med korrekt svensk grammatik. Undvik metaforer.\n\
- Använd [APP CONTEXT] för att anpassa svaren.\n\
- Syfte och deltagarprofil har egna guider; hänvisa dit i stället för att skriva dem här.\n\
- Ber användaren om analys av ett program: ge exakt 3 konkreta justeringar.\n\
- Ber användaren om en aktivitet: ge ett huvudförslag, sedan \"### Förslag på anpassningar och \
variation\" för analytiker, interaktörer och visionärer, och \"### NPF-anpassningar:\".\n\
- Gäller frågan fakta eller logistik: svara kort och rakt.\n\n\
{{hopa}}\n\n[APP CONTEXT]\n{{app_context}}\n\n[INSPIRED TIPS]\n{{tips}}\n\n\
Använd tipsen som inspiration men formulera svaret med egna ord.";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub tips_used: usize,
}

#[derive(Clone)]
pub struct Assistant {
    generator: TextGenerator,
    store: Arc<dyn EventStore>,
    template: ChatPromptTemplate,
}

impl Assistant {
    pub fn new(generator: TextGenerator, store: Arc<dyn EventStore>) -> Self {
        let template = ChatPromptTemplate::new(vec![
            MessagePromptTemplate::system(SYSTEM),
            MessagePromptTemplate::placeholder("history"),
            MessagePromptTemplate::human("{{message}}"),
        ]);
        Self {
            generator,
            store,
            template,
        }
    }

    /// Tips whose title, content or tags mention `query`.
    pub async fn search_tips(&self, query: &str) -> Result<Vec<Tip>, WizardError> {
        let query = query.trim();
        if search_needle(query).is_none() {
            return Err(WizardError::missing_input("query"));
        }
        let span = tracing::info_span!("tips_search", limit = TIPS_LIMIT);
        Ok(self
            .store
            .search_tips(query, TIPS_LIMIT)
            .instrument(span)
            .await?)
    }

    pub async fn reply(&self, request: &ChatRequest) -> Result<ChatReply, WizardError> {
        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| WizardError::missing_input("message"))?;

        let span = tracing::info_span!("assistant_reply", history = request.history.len());
        async move {
            let tips = match self.store.search_tips(message, TIPS_LIMIT).await {
                Ok(tips) => tips,
                Err(error) => {
                    warn!(%error, "tips lookup failed, answering without tips");
                    Vec::new()
                }
            };

            let messages = self
                .template
                .format_messages(&self.vars(message, request, &tips))?;
            let text = self
                .generator
                .generate_with(messages, &CompletionOptions::default())
                .await?;
            let reply = if text.is_empty() {
                FALLBACK_REPLY.to_string()
            } else {
                text
            };
            Ok(ChatReply {
                reply,
                tips_used: tips.len(),
            })
        }
        .instrument(span)
        .await
    }

    fn vars(&self, message: &str, request: &ChatRequest, tips: &[Tip]) -> PromptVars {
        let history: Vec<&Message> = request
            .history
            .iter()
            .filter(|m| m.role != Role::System)
            .collect();
        let app_context = request
            .context
            .as_ref()
            .and_then(|c| serde_json::to_string_pretty(c).ok())
            .unwrap_or_else(|| "{}".to_string());

        let mut vars = PromptVars::new();
        vars.insert("persona".to_string(), Value::from(UGGLAN));
        vars.insert("hopa".to_string(), Value::from(HOPA));
        vars.insert("app_context".to_string(), Value::from(app_context));
        vars.insert("tips".to_string(), Value::from(format_tips(tips)));
        vars.insert(
            "history".to_string(),
            serde_json::to_value(history).unwrap_or(Value::Null),
        );
        vars.insert("message".to_string(), Value::from(message));
        vars
    }
}

fn format_tips(tips: &[Tip]) -> String {
    if tips.is_empty() {
        return NO_TIPS.to_string();
    }
    tips.iter()
        .enumerate()
        .map(|(i, tip)| format!("{}. {}: {}", i + 1, tip.title, tip.content))
        .collect::<Vec<_>>()
        .join("\n")
}
