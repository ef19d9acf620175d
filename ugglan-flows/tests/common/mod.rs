#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ugglan_core::{LlmRequest, LlmResponse, Role, Runnable, UgglanError};
use ugglan_llm::TextGenerator;
use ugglan_store::{Bento, EventContext, EventStore, StoreError, Tip};

pub const PURPOSE_TEXT: &str = "Eventet ska ge medarbetarna tid att lära känna varandra och \
                                skapa en gemensam bild av nästa år.";
pub const AUDIENCE_TEXT: &str = "Deltagarna är nyfikna projektledare som vill dela \
                                 erfarenheter och hitta nya samarbeten.";
pub const FRAME_TEXT: &str = "Titel: Gemensam start\nBeskrivning: Vi landar tillsammans.\n\n\
Steg:\n1. Incheckning (5 min) – Alla säger en mening\n\nReflektion: Tyst minut\n\
Interaktion: Samtal i par\nNFI-index: 4\nEngagemangsnivå: 3";

/// Replays canned completions and records every request it sees.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    repeat: Option<String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(replies.into_iter().map(|r| Ok(r.into())).collect(), None, None)
    }

    /// Answers every call with the same text.
    pub fn repeating(text: &str) -> Arc<Self> {
        Self::build(VecDeque::new(), Some(text.to_string()), None)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::build(VecDeque::from([Err(message.to_string())]), None, None)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(VecDeque::new(), Some("sent".to_string()), Some(delay))
    }

    fn build(
        replies: VecDeque<Result<String, String>>,
        repeat: Option<String>,
        delay: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            repeat,
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn system_prompt(&self, call: usize) -> String {
        self.message(call, Role::System)
    }

    pub fn user_prompt(&self, call: usize) -> String {
        self.message(call, Role::User)
    }

    fn message(&self, call: usize, role: Role) -> String {
        let requests = self.requests();
        requests[call]
            .messages
            .iter()
            .rev()
            .find(|m| m.role == role)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Runnable<LlmRequest, LlmResponse> for ScriptedLlm {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, UgglanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(input);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.repeat) {
            (Some(Ok(content)), _) => Ok(LlmResponse { content }),
            (Some(Err(message)), _) => Err(UgglanError::LlmProvider(message)),
            (None, Some(content)) => Ok(LlmResponse {
                content: content.clone(),
            }),
            (None, None) => Err(UgglanError::LlmProvider("script exhausted".to_string())),
        }
    }
}

pub fn generator(llm: &Arc<ScriptedLlm>) -> TextGenerator {
    TextGenerator::new(llm.clone())
}

/// In-memory event datastore with a read counter.
#[derive(Default)]
pub struct MemoryStore {
    pub events: HashMap<String, EventContext>,
    pub bentos: Vec<Bento>,
    pub tips: Vec<Tip>,
    pub tips_unavailable: bool,
    pub reads: AtomicUsize,
}

impl MemoryStore {
    pub fn with_event(mut self, id: &str, purpose: &str, audience: &str) -> Self {
        self.events.insert(
            id.to_string(),
            EventContext {
                purpose: Some(purpose.to_string()),
                audience_profile: Some(audience.to_string()),
                program_notes: None,
            },
        );
        self
    }

    pub fn with_bento(mut self, id: &str, name: &str) -> Self {
        self.bentos.push(bento(id, name));
        self
    }

    pub fn with_tip(mut self, title: &str, content: &str) -> Self {
        self.tips.push(Tip {
            id: (self.tips.len() + 1).to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags: None,
        });
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn event_context(&self, event_id: &str) -> Result<EventContext, StoreError> {
        self.read();
        self.events
            .get(event_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: "event".to_string(),
                key: format!("id={event_id}"),
            })
    }

    async fn candidate_bentos(&self) -> Result<Vec<Bento>, StoreError> {
        self.read();
        Ok(self.bentos.iter().take(30).cloned().collect())
    }

    async fn bento(&self, bento_id: &str) -> Result<Bento, StoreError> {
        self.read();
        self.bentos
            .iter()
            .find(|b| b.id == bento_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: "bento_library".to_string(),
                key: format!("id={bento_id}"),
            })
    }

    async fn search_tips(&self, query: &str, limit: usize) -> Result<Vec<Tip>, StoreError> {
        self.read();
        if self.tips_unavailable {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        let needle = query.to_lowercase();
        Ok(self
            .tips
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.content.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

pub fn bento(id: &str, name: &str) -> Bento {
    Bento {
        id: id.to_string(),
        name: name.to_string(),
        short_description: Some(format!("{name} i korthet")),
        purpose_category: Some("relation".to_string()),
        hopa_profiles: vec!["Interaktörer".to_string()],
        eng_level: Some(3.0),
        nfi_index: Some(4.0),
        effects: None,
    }
}
