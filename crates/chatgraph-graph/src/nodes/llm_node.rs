use crate::node::Node;
use crate::prompt::PromptTemplate;
use crate::types::{GraphState, LlmConfig, StateUpdate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chatgraph_llm::{ChatClient, ChatOptions, ChatRequest, Message, Tool, ToolChoice};
use std::sync::Arc;
use std::time::Instant;

/// Calls the chat model with the turn's history.
///
/// Without a prompt template the history is sent as-is; with one, the history
/// is rendered into the template and sent as a single user message. The new
/// assistant message is appended to `messages` and to the turn's `history`.
pub struct LlmNode {
    name: String,
    client: Arc<dyn ChatClient>,
    llm_config: LlmConfig,
    tools: Vec<Tool>,
    prompt: Option<PromptTemplate>,
}

impl LlmNode {
    pub fn new(name: impl Into<String>, client: Arc<dyn ChatClient>, llm_config: LlmConfig) -> Self {
        Self {
            name: name.into(),
            client,
            llm_config,
            tools: Vec::new(),
            prompt: None,
        }
    }

    /// Bind tool schemas to every model call
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// History for this call: the windowed history plus tool results answering its last call
    fn turn_history(state: &GraphState) -> Vec<Message> {
        let mut history = state.history.clone();
        // The tool node only appends to `messages`
        if history.last().is_some_and(Message::has_tool_calls) {
            history.extend(state.trailing_tool_results().iter().cloned());
        }
        history
    }

    fn prompt_messages(&self, state: &GraphState, history: &[Message]) -> Vec<Message> {
        let messages = match &self.prompt {
            Some(template) => vec![Message::human(template.render(history))],
            None => history.to_vec(),
        };
        if !messages.is_empty() {
            return messages;
        }
        // A zero-length window still has to answer the current input
        state.last_user_message().cloned().into_iter().collect()
    }

    fn build_request(&self, messages: Vec<Message>) -> ChatRequest {
        let mut options = ChatOptions::new().tools(self.tools.clone());
        if !self.tools.is_empty() {
            options = options.tool_choice(ToolChoice::auto());
        }
        if let Some(temp) = self.llm_config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.llm_config.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        ChatRequest::new(self.llm_config.model.clone(), messages).with_options(options)
    }
}

#[async_trait]
impl Node for LlmNode {
    async fn execute(&self, state: &GraphState) -> Result<StateUpdate> {
        let mut history = Self::turn_history(state);
        let request = self.build_request(self.prompt_messages(state, &history));

        tracing::info!(
            node = %self.name,
            model = %request.model,
            context_messages = request.messages.len(),
            tools = self.tools.len(),
            "Calling model"
        );

        let start = Instant::now();
        let response = self
            .client
            .chat(request)
            .await
            .context("Model call failed")?;

        tracing::debug!(
            node = %self.name,
            duration_ms = start.elapsed().as_millis() as u64,
            finish_reason = ?response.finish_reason,
            "Model responded"
        );

        let message = response.into_message();
        history.push(message.clone());

        Ok(StateUpdate::messages(vec![message]).with_history(history))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_llm::{ChatResponse, ToolCall};
    use std::sync::Mutex;

    /// Records every request and answers with a fixed text
    struct RecordingClient {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(ChatResponse::text("ok"))
        }
    }

    fn recording() -> Arc<RecordingClient> {
        Arc::new(RecordingClient {
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_sends_history_and_appends_output() {
        let client = recording();
        let node = LlmNode::new("chatbot", client.clone(), LlmConfig::new("mock"));

        let mut state = GraphState::new("t1", vec![Message::human("old"), Message::human("new")]);
        state.history = vec![Message::human("new")];

        let update = node.execute(&state).await.unwrap();

        assert_eq!(update.messages, vec![Message::ai("ok")]);
        assert_eq!(update.history, Some(vec![Message::human("new"), Message::ai("ok")]));
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].messages, vec![Message::human("new")]);
        assert!(requests[0].options.tools.is_none());
    }

    #[tokio::test]
    async fn test_tool_results_follow_their_call_in_history() {
        let client = recording();
        let node = LlmNode::new("chatbot", client.clone(), LlmConfig::new("mock"));

        let call = ToolCall::new("c1", "calculate", r#"{"text":"1+1"}"#);
        let mut state = GraphState::new(
            "t1",
            vec![
                Message::human("1+1?"),
                Message::ai_with_tools(vec![call.clone()]),
                Message::tool_result("c1", "2"),
            ],
        );
        state.history = vec![Message::human("1+1?"), Message::ai_with_tools(vec![call.clone()])];

        node.execute(&state).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(
            requests[0].messages,
            vec![
                Message::human("1+1?"),
                Message::ai_with_tools(vec![call]),
                Message::tool_result("c1", "2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_prompt_template_renders_history() {
        let client = recording();
        let node = LlmNode::new("sql_executor", client.clone(), LlmConfig::new("mock"))
            .with_prompt(PromptTemplate::new("Question:\n{history}"));

        let mut state = GraphState::new("t1", vec![Message::human("count users")]);
        state.history = vec![Message::human("count users")];

        node.execute(&state).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].messages, vec![Message::human("Question:\nuser: count users")]);
    }

    #[tokio::test]
    async fn test_empty_history_falls_back_to_latest_user_message() {
        let client = recording();
        let node = LlmNode::new("chatbot", client.clone(), LlmConfig::new("mock"));
        let state = GraphState::new("t1", vec![Message::human("a"), Message::ai("b"), Message::human("c")]);

        let update = node.execute(&state).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].messages, vec![Message::human("c")]);
        assert_eq!(update.history, Some(vec![Message::ai("ok")]));
    }

    #[tokio::test]
    async fn test_binds_tools_with_auto_choice() {
        let client = recording();
        let tool = Tool::new("calculate", "math", serde_json::json!({"type": "object"}));
        let node = LlmNode::new("chatbot", client.clone(), LlmConfig::new("mock").with_temperature(0.0))
            .with_tools(vec![tool]);

        let mut state = GraphState::new("t1", vec![Message::human("hi")]);
        state.history = state.messages.clone();
        node.execute(&state).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].options.tool_choice, Some(ToolChoice::auto()));
        assert_eq!(requests[0].options.temperature, Some(0.0));
    }
}
