use anyhow::Result;
use async_trait::async_trait;
use chatgraph_llm::{ChatClient, ChatOptions, ChatRequest, ChatResponse, Message, Tool, ToolCall, ToolChoice};
use serde_json::json;

struct EchoClient;

#[async_trait]
impl ChatClient for EchoClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let last = request.messages.last().map(Message::text).unwrap_or_default();
        Ok(ChatResponse::text(format!("echo: {}", last)))
    }
}

#[test]
fn test_chat_request_with_options() {
    let options = ChatOptions::new().temperature(0.7).max_tokens(100);
    let request = ChatRequest::new("gpt-4o", vec![Message::human("Hello")]).with_options(options);

    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.options.temperature, Some(0.7));
    assert_eq!(request.options.max_tokens, Some(100));
}

#[test]
fn test_empty_tool_list_is_not_bound() {
    let options = ChatOptions::new().tools(vec![]);
    assert_eq!(options.tools, None);

    let options = ChatOptions::new()
        .tools(vec![Tool::new("test", "Test tool", json!({"type": "object"}))])
        .tool_choice(ToolChoice::auto());
    assert_eq!(options.tools.map(|t| t.len()), Some(1));
    assert!(options.tool_choice.is_some());
}

#[test]
fn test_response_into_message() {
    let msg = ChatResponse::text("hello").into_message();
    assert_eq!(msg, Message::ai("hello"));

    let call = ToolCall::new("call_1", "calculate", "{}");
    let msg = ChatResponse::tool_calls(vec![call.clone()]).into_message();
    assert_eq!(msg, Message::ai_with_tools(vec![call]));
}

#[tokio::test]
async fn test_chat_client_trait_object() {
    let client: Box<dyn ChatClient> = Box::new(EchoClient);
    let response = client
        .chat(ChatRequest::new("mock", vec![Message::human("ping")]))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("echo: ping"));
}
