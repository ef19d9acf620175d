mod common;

use common::{generator, ScriptedLlm};
use serde_json::json;
use ugglan_core::ResponseFormat;
use ugglan_flows::{FrameHelper, FrameHelperRequest, WizardError};

fn request(value: serde_json::Value) -> FrameHelperRequest {
    serde_json::from_value(value).unwrap()
}

fn suggestions() -> serde_json::Value {
    json!({
        "reflection_suggestion": "Avsluta med en tyst minut",
        "interaction_suggestion": "Fråga i Mentimeter",
        "steps": [
            {"label": "Intro", "duration": 5},
            {"label": "Samtal i par", "duration": 15}
        ],
        "nfi_index": 4,
        "engagement_level": 3
    })
}

#[tokio::test]
async fn returns_validated_suggestions() {
    let llm = ScriptedLlm::new([format!("```json\n{}\n```", suggestions())]);
    let helper = FrameHelper::new(generator(&llm));

    let reply = helper
        .suggest(&request(json!({
            "frame_id": 17,
            "existing_data": {"reflection": "Ingen"},
            "context": {"purpose": "Stärka teamet", "audience": "Säljare", "theme": "Höst"}
        })))
        .await
        .unwrap();

    assert!(reply.ok);
    assert_eq!(reply.frame_id.as_deref(), Some("17"));
    assert_eq!(serde_json::to_value(&reply.suggestions).unwrap(), suggestions());

    let sent = &llm.requests()[0];
    assert_eq!(sent.response_format, ResponseFormat::JsonObject);
    let user = llm.user_prompt(0);
    assert!(user.contains("Eventets syfte: Stärka teamet"));
    assert!(user.contains("Tema: Höst"));
    assert!(user.contains(r#"{"reflection":"Ingen"}"#));
}

#[tokio::test]
async fn purpose_and_audience_are_required() {
    let llm = ScriptedLlm::repeating(&suggestions().to_string());
    let helper = FrameHelper::new(generator(&llm));

    for body in [
        json!({"context": {"audience": "Säljare"}}),
        json!({"context": {"purpose": "Stärka teamet", "audience": "  "}}),
        json!({}),
    ] {
        let err = helper.suggest(&request(body)).await.unwrap_err();
        assert!(matches!(err, WizardError::MissingInput(_)));
    }
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn out_of_range_values_fail_generation() {
    let mut long_step = suggestions();
    long_step["steps"][1]["duration"] = json!(45);
    let mut high_index = suggestions();
    high_index["nfi_index"] = json!(9);

    for body in [long_step, high_index] {
        let llm = ScriptedLlm::new([body.to_string()]);
        let helper = FrameHelper::new(generator(&llm));
        let err = helper
            .suggest(&request(json!({
                "context": {"purpose": "Stärka teamet", "audience": "Säljare"}
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::GenerationFailed(_)), "{err}");
        assert_eq!(llm.calls(), 1);
    }
}

#[tokio::test]
async fn wrong_shape_fails_generation() {
    let llm = ScriptedLlm::new([r#"{"reflection": "Tyst minut"}"#]);
    let helper = FrameHelper::new(generator(&llm));

    let err = helper
        .suggest(&request(json!({
            "context": {"purpose": "Stärka teamet", "audience": "Säljare"}
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, WizardError::GenerationFailed(_)));
}
