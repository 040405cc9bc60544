pub mod types;
pub mod traits;
pub mod openai;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, TokenUsage};
pub use openai::OpenAIClient;
pub use types::{Message, MessageKind, Content, Tool, ToolCall, ToolChoice, FunctionCall};
