mod history_node;
mod llm_node;
mod tool_node;

pub use history_node::HistoryNode;
pub use llm_node::LlmNode;
pub use tool_node::ToolNode;
