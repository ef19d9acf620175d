use async_trait::async_trait;
use tracing::Instrument;

use crate::client::PostgrestClient;
use crate::{search_needle, Bento, EventContext, Query, StoreError, Tip};

const EVENT_TABLE: &str = "event";
const BENTO_TABLE: &str = "bento_library";
const TIPS_TABLE: &str = "Tipsbank";

const BENTO_COLUMNS: &str = "id, name, short_description, purpose_category, hopa_profiles, \
                             eng_level, nfi_index, effects";

/// Read-only view of the event datastore used by the frame flow and the assistant.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn event_context(&self, event_id: &str) -> Result<EventContext, StoreError>;

    /// Candidate bentos for ranking, capped by the store's configured limit.
    async fn candidate_bentos(&self) -> Result<Vec<Bento>, StoreError>;

    async fn bento(&self, bento_id: &str) -> Result<Bento, StoreError>;

    async fn search_tips(&self, query: &str, limit: usize) -> Result<Vec<Tip>, StoreError>;
}

#[derive(Clone, Debug)]
pub struct SupabaseStore {
    client: PostgrestClient,
    bento_limit: usize,
}

impl SupabaseStore {
    pub(crate) fn new(client: PostgrestClient, bento_limit: usize) -> Self {
        Self {
            client,
            bento_limit,
        }
    }

    pub fn builder() -> crate::SupabaseStoreBuilder {
        crate::SupabaseStoreBuilder::new()
    }

    pub fn bento_limit(&self) -> usize {
        self.bento_limit
    }
}

#[async_trait]
impl EventStore for SupabaseStore {
    async fn event_context(&self, event_id: &str) -> Result<EventContext, StoreError> {
        let span = tracing::info_span!("store_event_context", event_id = %event_id);
        let query = Query::select("purpose, audience_profile, program_notes").eq("id", event_id);
        self.client
            .select_one(EVENT_TABLE, query, &format!("id={event_id}"))
            .instrument(span)
            .await
    }

    async fn candidate_bentos(&self) -> Result<Vec<Bento>, StoreError> {
        let span = tracing::info_span!("store_candidate_bentos", limit = self.bento_limit);
        let query = Query::select(BENTO_COLUMNS).limit(self.bento_limit);
        self.client
            .select(BENTO_TABLE, &query)
            .instrument(span)
            .await
    }

    async fn bento(&self, bento_id: &str) -> Result<Bento, StoreError> {
        let span = tracing::info_span!("store_bento", bento_id = %bento_id);
        let query = Query::select(BENTO_COLUMNS).eq("id", bento_id);
        self.client
            .select_one(BENTO_TABLE, query, &format!("id={bento_id}"))
            .instrument(span)
            .await
    }

    async fn search_tips(&self, query: &str, limit: usize) -> Result<Vec<Tip>, StoreError> {
        if search_needle(query).is_none() {
            return Ok(Vec::new());
        }
        let span = tracing::info_span!("store_search_tips", limit = limit);
        let query = Query::select("id, title, content, tags")
            .ilike_any(&["title", "content", "tags"], query)
            .limit(limit);
        let tips = self
            .client
            .select::<Tip>(TIPS_TABLE, &query)
            .instrument(span)
            .await?;
        tracing::debug!(found = tips.len(), "tips search finished");
        Ok(tips)
    }
}
