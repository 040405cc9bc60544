use axum::{
    extract::State,
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chatgraph_graph::{
    BuildContext, GraphBlueprint, GraphConfig, GraphEvent, HistoryWindow, LlmConfig, Message,
};
use chatgraph_llm::ToolCall;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    relay::spawn_relay,
    state::AppState,
};

/// Thread ids arrive as numbers or strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThreadId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadId::Int(id) => write!(f, "{}", id),
            ThreadId::Text(id) => f.write_str(id),
        }
    }
}

fn default_stream() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AgentChatInput {
    /// New messages for this turn, OpenAI chat format
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<Message>,
    pub model: Option<String>,
    /// Registered graph name; the configured default when absent
    pub graph: Option<String>,
    #[schema(value_type = Option<String>)]
    pub thread_id: Option<ThreadId>,
    pub temperature: Option<f32>,
    pub max_completion_tokens: Option<u32>,
    /// Names of tools the graph may call
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default = "default_stream")]
    pub stream: bool,
    pub history_len: Option<i64>,
    /// Message kinds left out of the history window; tool results when empty
    #[serde(default)]
    pub exclude_types: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub thread_id: String,
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatCompletionMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatCompletion {
    fn from_message(model: &str, thread_id: &str, message: Option<Message>) -> Self {
        let (content, tool_calls) = match &message {
            Some(msg) => {
                let text = msg.text();
                ((!text.is_empty()).then_some(text), msg.tool_calls().to_vec())
            }
            None => (None, Vec::new()),
        };
        let finish_reason = if tool_calls.is_empty() { "stop" } else { "tool_calls" };

        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            thread_id: thread_id.to_string(),
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatCompletionMessage {
                    role: "assistant".to_string(),
                    content,
                    tool_calls,
                },
                finish_reason: finish_reason.to_string(),
            }],
        }
    }
}

/// Run one conversation turn through a graph
///
/// With `stream` (the default) every node's update is sent as one SSE `data:`
/// frame, `{"<node>": {...}}`; a failure ends the stream with `{"error": "..."}`.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    request_body = AgentChatInput,
    responses(
        (status = 200, description = "SSE stream of graph events, or a chat.completion object", body = ChatCompletion),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Graph not found")
    ),
    tag = "chat"
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(input): Json<AgentChatInput>,
) -> ApiResult<Response> {
    if input.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }

    let settings = &state.config.graph;
    let graph_name = input.graph.as_deref().unwrap_or(&settings.default_graph);
    let blueprint = state.graphs.get(graph_name)?;

    let history_len = input.history_len.unwrap_or(settings.history_len as i64);
    let window = HistoryWindow::parse(history_len, &input.exclude_types)?;
    let tools = state.tools.subset(&input.tools)?;

    let mut llm = LlmConfig::from(&state.config.llm);
    if let Some(model) = &input.model {
        llm.model = model.clone();
    }
    if input.temperature.is_some() {
        llm.temperature = input.temperature;
    }
    if input.max_completion_tokens.is_some() {
        llm.max_tokens = input.max_completion_tokens;
    }
    let model = llm.model.clone();

    let mut ctx = BuildContext::new(Arc::clone(&state.llm_client), llm)
        .with_tools(tools)
        .with_window(window)
        .with_graph_config(GraphConfig::new().with_max_iterations(settings.max_iterations));

    // Only threads the caller can name again are checkpointed
    let thread_id = match input.thread_id {
        Some(id) => {
            ctx = ctx.with_checkpointer(Arc::clone(&state.checkpointer));
            id.to_string()
        }
        None => uuid::Uuid::new_v4().to_string(),
    };
    let graph = blueprint.build(&ctx)?;
    let turn = graph.initial_state(&thread_id, input.messages).await?;

    tracing::info!(
        graph = %blueprint.name(),
        thread_id = %thread_id,
        run_id = %turn.run_id,
        messages = turn.messages.len(),
        history_len,
        stream = input.stream,
        "Starting turn"
    );

    if input.stream {
        let cancel = state.shutdown.child_token();
        let frames = spawn_relay(graph.stream(turn), cancel, settings.stream_timeout());
        let events = frames.map(|frame| Ok::<_, Infallible>(frame.into_sse()));

        return Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response());
    }

    let events = graph.invoke(turn).await?;
    let reply = final_reply(blueprint.as_ref(), &events);
    Ok(Json(ChatCompletion::from_message(&model, &thread_id, reply)).into_response())
}

/// The last message the blueprint surfaces from a finished turn
fn final_reply(blueprint: &dyn GraphBlueprint, events: &[GraphEvent]) -> Option<Message> {
    events.iter().filter_map(|event| blueprint.handle_event(event)).last()
}
