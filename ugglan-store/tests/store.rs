use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ugglan_store::{EventStore, StoreError, SupabaseStore};

fn store(server: &MockServer) -> SupabaseStore {
    SupabaseStore::builder()
        .base_url(server.uri())
        .api_key("service-key")
        .bento_limit(30)
        .build()
        .unwrap()
}

#[tokio::test]
async fn event_context_reads_single_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/event"))
        .and(query_param("select", "purpose,audience_profile,program_notes"))
        .and(query_param("id", "eq.ev-7"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "purpose": "Stärka gemenskapen",
            "audience_profile": "Deltagarna är nyanställda.",
            "program_notes": null
        }])))
        .mount(&server)
        .await;

    let context = store(&server).event_context("ev-7").await.unwrap();
    assert_eq!(context.purpose.as_deref(), Some("Stärka gemenskapen"));
    assert_eq!(context.program_notes, None);
}

#[tokio::test]
async fn candidate_bentos_respects_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bento_library"))
        .and(query_param("limit", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "b1", "name": "Walk and talk", "hopa_profiles": ["Interaktörer"], "eng_level": 4},
            {"id": 2, "name": "Tyst reflektion"}
        ])))
        .mount(&server)
        .await;

    let bentos = store(&server).candidate_bentos().await.unwrap();
    assert_eq!(bentos.len(), 2);
    assert_eq!(bentos[0].eng_level, Some(4.0));
    assert_eq!(bentos[1].id, "2");
}

#[tokio::test]
async fn search_tips_queries_title_content_and_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/Tipsbank"))
        .and(query_param(
            "or",
            "(title.ilike.*pauser*,content.ilike.*pauser*,tags.ilike.*pauser*)",
        ))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Korta pauser", "content": "Var 45:e minut.", "tags": "energi"}
        ])))
        .mount(&server)
        .await;

    let tips = store(&server).search_tips("pauser", 5).await.unwrap();
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].title, "Korta pauser");
}

#[tokio::test]
async fn punctuation_only_tips_query_matches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/Tipsbank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Korta pauser", "content": "Var 45:e minut.", "tags": "energi"}
        ])))
        .expect(0)
        .mount(&server)
        .await;

    let tips = store(&server).search_tips("(((", 5).await.unwrap();
    assert!(tips.is_empty());
}

#[tokio::test]
async fn missing_event_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server).event_context("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn builder_requires_credentials() {
    let err = SupabaseStore::builder()
        .base_url("https://example.supabase.co")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("api_key is required"));
}

#[test]
fn builder_rejects_zero_bento_limit() {
    let err = SupabaseStore::builder()
        .base_url("https://example.supabase.co")
        .api_key("key")
        .bento_limit(0)
        .build()
        .unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}

#[test]
fn builder_debug_redacts_key() {
    let builder = SupabaseStore::builder().api_key("super-secret");
    let debug = format!("{builder:?}");
    assert!(!debug.contains("super-secret"));
}
