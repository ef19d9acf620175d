use serde_json::json;
use ugglan_prompt::{PromptTemplate, PromptVars};

#[test]
fn renders_template_with_vars() {
    let tmpl = PromptTemplate::new("WHY1: {{why1}}\nWHY2: {{ why2 }}");
    let mut vars = PromptVars::new();
    vars.insert("why1".to_string(), json!("Samla teamet"));
    vars.insert("why2".to_string(), json!("Bygga tillit"));
    let rendered = tmpl.render(&vars).expect("render");
    assert_eq!(rendered, "WHY1: Samla teamet\nWHY2: Bygga tillit");
}

#[test]
fn does_not_confuse_overlapping_keys() {
    let tmpl = PromptTemplate::new("{{name}} {{fullname}}");
    let mut vars = PromptVars::new();
    vars.insert("name".to_string(), json!("X"));
    vars.insert("fullname".to_string(), json!("Y"));
    assert_eq!(tmpl.render(&vars).expect("render"), "X Y");
}

#[test]
fn missing_and_null_vars_render_empty() {
    let tmpl = PromptTemplate::new("Syfte: {{purpose}}|Ämne: {{theme}}|");
    let mut vars = PromptVars::new();
    vars.insert("theme".to_string(), serde_json::Value::Null);
    assert_eq!(tmpl.render(&vars).expect("render"), "Syfte: |Ämne: |");
}

#[test]
fn non_string_values_render_as_json() {
    let tmpl = PromptTemplate::new("Data: {{data}}");
    let mut vars = PromptVars::new();
    vars.insert("data".to_string(), json!({"steps": 3}));
    assert_eq!(tmpl.render(&vars).expect("render"), r#"Data: {"steps":3}"#);
}
