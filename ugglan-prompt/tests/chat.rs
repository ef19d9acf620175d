use serde_json::json;
use ugglan_core::Role;
use ugglan_prompt::{ChatPromptTemplate, MessagePromptTemplate, PromptVars};

#[test]
fn chat_prompt_formats_messages() {
    let template = ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system("Du är Ugglan."),
        MessagePromptTemplate::human("Hej, jag planerar {{event}}."),
    ]);

    let mut vars = PromptVars::new();
    vars.insert("event".to_string(), json!("en kickoff"));

    let messages = template.format_messages(&vars).unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, "Du är Ugglan.");
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "Hej, jag planerar en kickoff.");
}

#[test]
fn chat_prompt_handles_placeholders() {
    let template = ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system("System"),
        MessagePromptTemplate::placeholder("history"),
        MessagePromptTemplate::human("User"),
    ]);

    let mut vars = PromptVars::new();
    vars.insert(
        "history".to_string(),
        json!([
            { "role": "user", "content": "Hi" },
            { "role": "assistant", "content": "Hello" }
        ]),
    );

    let messages = template.format_messages(&vars).unwrap();

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "Hi");
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "Hello");
}

#[test]
fn missing_placeholder_is_skipped() {
    let template = ChatPromptTemplate::new(vec![
        MessagePromptTemplate::placeholder("history"),
        MessagePromptTemplate::human("User"),
    ]);
    let messages = template.format_messages(&PromptVars::new()).unwrap();
    assert_eq!(messages.len(), 1);
}

#[test]
fn malformed_placeholder_is_rejected() {
    let template = ChatPromptTemplate::new(vec![MessagePromptTemplate::placeholder("history")]);
    let mut vars = PromptVars::new();
    vars.insert("history".to_string(), json!("not messages"));
    assert!(template.format_messages(&vars).is_err());
}
