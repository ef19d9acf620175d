use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::trace::TraceLayer;
use ugglan_flows::{
    Assistant, ChatReply, ChatRequest, Dispatcher, FrameFlow, FrameHelper, FrameHelperReply,
    FrameHelperRequest, WizardKind, WizardReply, WizardRequest,
};
use ugglan_llm::{OpenAiCompatibleClient, TextGenerator};
use ugglan_store::{EventStore, SupabaseStore, Tip};

use crate::extract::{parse_body, JsonBody};
use crate::{ApiError, ConfigError, ServerConfig};

const BODY_LIMIT_BYTES: usize = 256 * 1024;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    frames: FrameFlow,
    helper: FrameHelper,
    assistant: Assistant,
}

impl AppState {
    pub fn new(generator: TextGenerator, store: Arc<dyn EventStore>) -> Self {
        Self {
            dispatcher: Dispatcher::new(generator.clone()),
            frames: FrameFlow::new(generator.clone(), store.clone()),
            helper: FrameHelper::new(generator.clone()),
            assistant: Assistant::new(generator, store),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let client = OpenAiCompatibleClient::builder()
            .base_url(&config.openai_base_url)
            .and_then(|builder| {
                builder
                    .api_key(config.openai_api_key())
                    .default_model(config.model.clone())
                    .timeout(config.llm_timeout)
                    .build()
            })
            .map_err(|e| ConfigError::Client {
                client: "completion client",
                reason: e.to_string(),
            })?;
        let store = SupabaseStore::builder()
            .base_url(config.supabase_url.clone())
            .api_key(config.supabase_key())
            .build()
            .map_err(|e| ConfigError::Client {
                client: "datastore client",
                reason: e.to_string(),
            })?;
        let generator = TextGenerator::new(Arc::new(client))
            .with_model(config.model.clone())
            .with_timeout(config.llm_timeout);
        Ok(Self::new(generator, Arc::new(store)))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/api/purpose_flow", post_only(post(purpose_flow)))
        .route("/api/audience_flow", post_only(post(audience_flow)))
        .route("/api/event_data_wizard", post_only(post(event_data_wizard)))
        .route("/api/frame_ollo_flow", post_only(post(frame_ollo_flow)))
        .route("/api/frame_helper", post_only(post(frame_helper)))
        .route("/api/tips_search", post_only(post(tips_search)))
        .route("/api/uggla", post_only(post(uggla)))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(MapResponseBodyLayer::new(Body::new))
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES)),
        )
}

fn post_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn purpose_flow(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<WizardRequest>,
) -> Result<Json<WizardReply>, ApiError> {
    wizard(&state, WizardKind::Purpose, request).await
}

async fn audience_flow(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<WizardRequest>,
) -> Result<Json<WizardReply>, ApiError> {
    wizard(&state, WizardKind::Audience, request).await
}

async fn event_data_wizard(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<WizardRequest>,
) -> Result<Json<WizardReply>, ApiError> {
    wizard(&state, WizardKind::EventData, request).await
}

async fn wizard(
    state: &AppState,
    kind: WizardKind,
    request: WizardRequest,
) -> Result<Json<WizardReply>, ApiError> {
    Ok(Json(state.dispatcher.handle(kind, &request).await?))
}

async fn frame_ollo_flow(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<WizardRequest>,
) -> Result<Json<WizardReply>, ApiError> {
    Ok(Json(state.frames.handle(&request).await?))
}

async fn frame_helper(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<FrameHelperRequest>,
) -> Result<Json<FrameHelperReply>, ApiError> {
    Ok(Json(state.helper.suggest(&request).await?))
}

async fn uggla(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    Ok(Json(state.assistant.reply(&request).await?))
}

#[derive(Debug, Default, Deserialize)]
struct TipsQuery {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct TipsReply {
    ok: bool,
    results: Vec<Tip>,
}

/// The query may come in the body or as `?query=`. A body that is not JSON is ignored
/// rather than rejected.
async fn tips_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<TipsReply>, ApiError> {
    let from_body = parse_body::<TipsQuery>(&body)
        .ok()
        .and_then(|q| q.query)
        .filter(|q| !q.trim().is_empty());
    let query = from_body
        .or_else(|| params.get("query").cloned())
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("Missing 'query'. Provide it in JSON body or query param.")
        })?;
    let results = state.assistant.search_tips(&query).await?;
    Ok(Json(TipsReply { ok: true, results }))
}
