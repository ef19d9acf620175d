use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use ugglan_core::{Runnable, UgglanError};
use ugglan_llm::{LlmRequest, Message, OpenAiCompatibleClient, ResponseFormat, TextGenerator};

fn client(server: &MockServer) -> OpenAiCompatibleClient {
    OpenAiCompatibleClient::builder()
        .base_url(&server.url(""))
        .expect("valid url")
        .api_key("test-key")
        .default_model("gpt-4o-mini")
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client")
}

fn request(model: &str) -> LlmRequest {
    LlmRequest {
        model: model.to_string(),
        messages: vec![Message::system("Du är Ugglan."), Message::user("hej")],
        temperature: Some(0.3),
        response_format: ResponseFormat::Text,
    }
}

#[tokio::test]
async fn invoke_maps_first_choice() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-key")
            .json_body(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Du är Ugglan."},
                    {"role": "user", "content": "hej"}
                ],
                "temperature": 0.3,
                "stream": false
            }));
        then.status(200).json_body(json!({
            "id": "chat-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "  Hej hej!  "},
                "finish_reason": "stop"
            }]
        }));
    });

    let response = client(&server).invoke(request("")).await.expect("invoke");
    assert_eq!(response.content, "  Hej hej!  ");
    mock.assert();
}

#[tokio::test]
async fn invoke_requests_json_object_format() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(r#"{"model": "gpt-4o", "response_format": {"type": "json_object"}}"#);
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "{}"}}]
        }));
    });

    let mut req = request("gpt-4o");
    req.response_format = ResponseFormat::JsonObject;
    let response = client(&server).invoke(req).await.expect("invoke");
    assert_eq!(response.content, "{}");
    mock.assert();
}

#[tokio::test]
async fn null_content_becomes_empty_string() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }));
    });

    let response = client(&server).invoke(request("")).await.expect("invoke");
    assert_eq!(response.content, "");
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401).json_body(json!({
            "error": {"message": "Invalid API key", "type": "authentication_error", "code": "invalid_api_key"}
        }));
    });

    let err = client(&server).invoke(request("")).await.unwrap_err();
    match err {
        UgglanError::LlmProvider(message) => {
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("expected LlmProvider, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({"choices": []}));
    });

    let err = client(&server).invoke(request("")).await.unwrap_err();
    assert!(err.to_string().contains("no choices"));
}

#[test]
fn builder_requires_api_key() {
    let err = OpenAiCompatibleClient::builder()
        .base_url("https://api.openai.com")
        .expect("valid url")
        .default_model("gpt-4o-mini")
        .build()
        .unwrap_err();
    assert!(matches!(err, UgglanError::InvalidConfig(_)));
}

#[test]
fn builder_rejects_invalid_url() {
    assert!(OpenAiCompatibleClient::builder().base_url("not a url").is_err());
}

#[test]
fn debug_output_redacts_api_key() {
    let client = OpenAiCompatibleClient::builder()
        .base_url("https://api.openai.com")
        .expect("valid url")
        .api_key("sk-secret")
        .default_model("gpt-4o-mini")
        .build()
        .expect("client");
    let debug = format!("{client:?}");
    assert!(!debug.contains("sk-secret"));
    assert!(debug.contains("<redacted>"));
}

#[tokio::test]
async fn slow_provider_is_a_timeout_not_a_provider_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "sent"}}]
            }));
    });
    let limit = Duration::from_millis(300);
    let client = OpenAiCompatibleClient::builder()
        .base_url(&server.url(""))
        .expect("valid url")
        .api_key("test-key")
        .default_model("gpt-4o-mini")
        .timeout(limit)
        .build()
        .expect("client");

    let err = client.invoke(request("")).await.unwrap_err();
    assert!(matches!(err, UgglanError::Timeout(d) if d == limit), "{err:?}");

    // Same limit on the client and the generator, as the server wires them.
    let generator = TextGenerator::new(Arc::new(client))
        .with_model("gpt-4o-mini")
        .with_timeout(limit);
    for _ in 0..5 {
        let err = generator.generate("system", "user").await.unwrap_err();
        assert!(matches!(err, UgglanError::Timeout(_)), "{err:?}");
    }
}
