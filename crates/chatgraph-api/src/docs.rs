use utoipa::OpenApi;

use crate::routes::{
    chat::{self, AgentChatInput, ChatCompletion, ChatCompletionChoice, ChatCompletionMessage},
    graphs,
    health::{self, HealthResponse},
    threads,
    tools::{self, CallToolRequest},
    BaseResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "chatgraph API", description = "Conversation graphs over HTTP and SSE"),
    paths(
        health::health_check,
        graphs::list_graphs,
        graphs::list_titles,
        graphs::find_by_title,
        threads::delete_thread,
        tools::list_tools,
        tools::call_tool,
        chat::chat_completions,
    ),
    components(schemas(
        BaseResponse,
        HealthResponse,
        CallToolRequest,
        AgentChatInput,
        ChatCompletion,
        ChatCompletionChoice,
        ChatCompletionMessage,
    )),
    tags(
        (name = "health"),
        (name = "graphs"),
        (name = "threads"),
        (name = "tools"),
        (name = "chat")
    )
)]
pub struct ApiDoc;
