// OpenAI-compatible chat completions client

use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::{Content, ContentPart, Message, ToolCall};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Client for any server speaking the OpenAI `/chat/completions` protocol
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !api_key.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .context("Invalid API key format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at another OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn build_chat_request(
        model: &str,
        messages: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<Value> {
        let openai_messages: Vec<Value> = messages
            .into_iter()
            .map(Self::convert_message)
            .collect();

        let mut obj = Map::new();
        obj.insert("model".to_string(), json!(model));
        obj.insert("messages".to_string(), Value::Array(openai_messages));
        obj.insert("stream".to_string(), json!(false));

        if let Some(temp) = options.temperature {
            obj.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tokens) = options.max_tokens {
            obj.insert("max_tokens".to_string(), json!(max_tokens));
        }
        if let Some(tools) = &options.tools {
            obj.insert("tools".to_string(), serde_json::to_value(tools)?);
        }
        if let Some(tool_choice) = &options.tool_choice {
            obj.insert("tool_choice".to_string(), serde_json::to_value(tool_choice)?);
        }

        Ok(Value::Object(obj))
    }

    fn convert_message(message: Message) -> Value {
        let mut obj = Map::new();
        obj.insert("role".to_string(), json!(message.role()));

        match message {
            Message::System { content, name } | Message::Human { content, name } => {
                obj.insert("content".to_string(), Self::convert_content(content));
                if let Some(name) = name {
                    obj.insert("name".to_string(), json!(name));
                }
            }
            Message::AI { content, tool_calls, name } => {
                // Assistant messages that only call tools still need an explicit null content
                let content = content.map(Self::convert_content).unwrap_or(Value::Null);
                obj.insert("content".to_string(), content);
                if let Some(tool_calls) = tool_calls {
                    obj.insert("tool_calls".to_string(), json!(tool_calls));
                }
                if let Some(name) = name {
                    obj.insert("name".to_string(), json!(name));
                }
            }
            Message::Tool { tool_call_id, content } => {
                obj.insert("tool_call_id".to_string(), json!(tool_call_id));
                obj.insert("content".to_string(), Self::convert_content(content));
            }
        }

        Value::Object(obj)
    }

    fn convert_content(content: Content) -> Value {
        match content {
            Content::Text(s) => json!(s),
            Content::Parts(parts) => {
                let converted: Vec<Value> = parts
                    .into_iter()
                    .map(|ContentPart::Text { text }| json!({ "type": "text", "text": text }))
                    .collect();
                json!(converted)
            }
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = Self::build_chat_request(&request.model, request.messages, &request.options)?;

        tracing::debug!(model = %request.model, "Sending chat completion request");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let raw: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            tool_calls: choice.and_then(|c| c.message.tool_calls.clone()),
            usage: raw.usage.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(&raw)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tool, ToolChoice};

    #[test]
    fn test_payload_includes_options() {
        let options = ChatOptions::new()
            .temperature(0.0)
            .max_tokens(256)
            .tools(vec![Tool::new("calculate", "Evaluate math", json!({"type": "object"}))])
            .tool_choice(ToolChoice::auto());

        let payload = OpenAIClient::build_chat_request(
            "qwen2.5-instruct",
            vec![Message::human("3+5/2?")],
            &options,
        )
        .unwrap();

        assert_eq!(payload["model"], "qwen2.5-instruct");
        assert_eq!(payload["max_tokens"], 256);
        assert_eq!(payload["tool_choice"], "auto");
        assert_eq!(payload["tools"][0]["function"]["name"], "calculate");
        assert_eq!(payload["messages"][0]["role"], "user");
    }

    #[test]
    fn test_tool_call_message_has_null_content() {
        let call = ToolCall::new("call_1", "calculate", r#"{"text":"1+1"}"#);
        let value = OpenAIClient::convert_message(Message::ai_with_tools(vec![call]));

        assert_eq!(value["role"], "assistant");
        assert!(value["content"].is_null());
        assert_eq!(value["tool_calls"][0]["id"], "call_1");
    }

    #[test]
    fn test_tool_result_message() {
        let value = OpenAIClient::convert_message(Message::tool_result("call_1", "2"));

        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_1");
        assert_eq!(value["content"], "2");
    }

    #[test]
    fn test_base_url_override() {
        let client = OpenAIClient::new("sk-test")
            .unwrap()
            .with_base_url("http://127.0.0.1:9997/v1/");

        assert_eq!(client.base_url(), "http://127.0.0.1:9997/v1");
    }
}
