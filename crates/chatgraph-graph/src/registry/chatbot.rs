use super::{BuildContext, GraphBlueprint, GraphLabel};
use crate::graph::{CompiledGraph, StateGraph};
use crate::nodes::{HistoryNode, LlmNode, ToolNode};
use crate::router::ToolsCondition;
use anyhow::Result;
use std::sync::Arc;

/// General assistant that may call tools:
/// `history_manager -> chatbot -> (tools -> chatbot)* -> end`
pub struct ChatbotGraph;

impl ChatbotGraph {
    pub const NODE: &'static str = "chatbot";
}

impl GraphBlueprint for ChatbotGraph {
    fn name(&self) -> &str {
        "chatbot"
    }

    fn label(&self) -> GraphLabel {
        GraphLabel::Agent
    }

    fn title(&self) -> &str {
        "Chatbot"
    }

    fn description(&self) -> &str {
        "Conversational assistant that can call the selected tools"
    }

    fn build(&self, ctx: &BuildContext) -> Result<CompiledGraph> {
        let chatbot = LlmNode::new(Self::NODE, Arc::clone(&ctx.client), ctx.llm.clone())
            .with_tools(ctx.tools.schemas());

        let mut graph = StateGraph::new()
            .add_node(Arc::new(HistoryNode::new(ctx.window.clone())))
            .add_node(Arc::new(chatbot))
            .add_node(Arc::new(ToolNode::new(Arc::clone(&ctx.tools))))
            .set_entry_point(HistoryNode::DEFAULT_NAME)
            .add_edge(HistoryNode::DEFAULT_NAME, Self::NODE)
            .add_conditional_edges(Self::NODE, Arc::new(ToolsCondition::new(ToolNode::DEFAULT_NAME)))
            .add_edge(ToolNode::DEFAULT_NAME, Self::NODE);

        if let Some(checkpointer) = &ctx.checkpointer {
            graph = graph.with_checkpointer(Arc::clone(checkpointer));
        }

        graph.compile(ctx.graph.clone())
    }
}
