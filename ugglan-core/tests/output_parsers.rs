use serde_json::{json, Value};
use ugglan_core::{JsonOutputParser, LlmResponse, Runnable, UgglanError};

#[tokio::test]
async fn json_output_parser_strips_code_fences() {
    let parser = JsonOutputParser::<Value>::new();

    let plain = r#"{"key": "value"}"#;
    let output = Runnable::<String, Value>::invoke(&parser, plain.to_string())
        .await
        .unwrap();
    assert_eq!(output, json!({"key": "value"}));

    let markdown_json = r#"```json
[
    {"id": "b1", "motivation": "calm start"}
]
```"#;
    let response = LlmResponse {
        content: markdown_json.to_string(),
    };
    let output = Runnable::<LlmResponse, Value>::invoke(&parser, response)
        .await
        .unwrap();
    assert_eq!(output, json!([{"id": "b1", "motivation": "calm start"}]));
}

#[tokio::test]
async fn json_output_parser_reports_shape_mismatch() {
    #[derive(serde::Deserialize, Debug)]
    #[allow(dead_code)]
    struct Ranked {
        id: String,
        motivation: String,
    }

    let parser = JsonOutputParser::<Vec<Ranked>>::new();
    let err = parser.parse(r#"{"id": "b1"}"#).unwrap_err();
    match err {
        UgglanError::ParseFailed { output, .. } => assert!(output.contains("b1")),
        other => panic!("expected ParseFailed, got {other:?}"),
    }
}

#[test]
fn json_output_parser_rejects_empty_output() {
    let parser = JsonOutputParser::<Value>::new();
    assert!(matches!(
        parser.parse("   "),
        Err(UgglanError::ParseFailed { .. })
    ));
}
