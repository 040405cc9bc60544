pub mod types;
pub mod history;
pub mod node;
pub mod nodes;
pub mod router;
pub mod graph;
pub mod prompt;
pub mod tools;
pub mod checkpoint;
pub mod registry;

pub use types::{GraphConfig, GraphEvent, GraphState, LlmConfig, StateUpdate};
pub use history::{HistoryError, HistoryWindow};
pub use node::Node;
pub use nodes::{HistoryNode, LlmNode, ToolNode};
pub use router::{NextNode, Router, ToolsCondition, END};
pub use graph::{CompiledGraph, StateGraph};
pub use prompt::PromptTemplate;
pub use tools::{AgentTool, ToolError, ToolRegistry};
pub use checkpoint::{Checkpointer, MemoryCheckpointer};
pub use registry::{BuildContext, GraphBlueprint, GraphDescriptor, GraphLabel, GraphRegistry, RegistryError};

// Re-export the message model so callers need a single import
pub use chatgraph_llm::{ChatClient, Message, MessageKind};
