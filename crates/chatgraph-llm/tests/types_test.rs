use chatgraph_llm::{Content, Message, MessageKind, Tool, ToolCall, ToolChoice};
use serde_json::json;

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_message_roles() {
    assert_eq!(Message::system("You are helpful").role(), "system");
    assert_eq!(Message::human("Hello").role(), "user");
    assert_eq!(Message::ai("Hi there!").role(), "assistant");
    assert_eq!(Message::tool_result("call_123", "42").role(), "tool");
}

#[test]
fn test_message_kind_matches_role() {
    assert_eq!(Message::human("Hello").kind(), MessageKind::User);
    assert_eq!(Message::tool_result("call_1", "ok").kind(), MessageKind::Tool);
}

#[test]
fn test_message_kind_parsing() {
    assert_eq!("tool".parse::<MessageKind>(), Ok(MessageKind::Tool));
    assert_eq!(" Assistant ".parse::<MessageKind>(), Ok(MessageKind::Assistant));
    assert_eq!("human".parse::<MessageKind>(), Ok(MessageKind::User));
    assert!("function".parse::<MessageKind>().is_err());
}

#[test]
fn test_openai_user_message_deserialization() {
    let json = r#"{"role":"user","content":"Please search the web"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg, Message::human("Please search the web"));
}

#[test]
fn test_openai_assistant_tool_call_deserialization() {
    let json = r#"{
        "role": "assistant",
        "content": null,
        "tool_calls": [
            {"id": "call_1", "type": "function", "function": {"name": "search_internet", "arguments": "{\"query\":\"rust\"}"}}
        ]
    }"#;
    let msg: Message = serde_json::from_str(json).unwrap();

    assert!(msg.has_tool_calls());
    assert_eq!(msg.tool_calls()[0].function.name, "search_internet");
    assert_eq!(msg.text(), "");
}

#[test]
fn test_assistant_without_tool_calls() {
    let msg = Message::ai("done");
    assert!(!msg.has_tool_calls());

    let empty_calls = Message::AI {
        content: Some(Content::text("done")),
        tool_calls: Some(vec![]),
        name: None,
    };
    assert!(!empty_calls.has_tool_calls());
}

#[test]
fn test_message_serialization_skips_missing_fields() {
    let json = serde_json::to_string(&Message::ai("Response")).unwrap();
    assert!(json.contains("\"role\":\"assistant\""));
    assert!(!json.contains("tool_calls"));
}

#[test]
fn test_tool_creation() {
    let tool = Tool::new(
        "calculate",
        "Evaluate an arithmetic expression",
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"}
            }
        }),
    );

    assert_eq!(tool.tool_type, "function");
    assert_eq!(tool.function.name, "calculate");
}

#[test]
fn test_tool_call_arguments() {
    let call = ToolCall::new("call_9", "calculate", r#"{"text":"3+5/2"}"#);
    assert_eq!(call.arguments_value().unwrap()["text"], "3+5/2");

    let empty = ToolCall::new("call_10", "current_time", "");
    assert_eq!(empty.arguments_value().unwrap(), json!({}));
}

#[test]
fn test_tool_choice_serialization() {
    assert_eq!(serde_json::to_value(ToolChoice::auto()).unwrap(), json!("auto"));
    assert_eq!(
        serde_json::to_value(ToolChoice::force("calculate")).unwrap(),
        json!({"type": "function", "function": {"name": "calculate"}})
    );
}
