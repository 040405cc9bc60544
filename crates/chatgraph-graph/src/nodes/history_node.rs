use crate::history::HistoryWindow;
use crate::node::Node;
use crate::types::{GraphState, StateUpdate};
use anyhow::Result;
use async_trait::async_trait;

/// Recomputes the turn's `history` from the message log.
///
/// Usually the entry node of a graph, so every model call in the turn sees a
/// bounded context instead of the whole conversation.
pub struct HistoryNode {
    name: String,
    window: HistoryWindow,
}

impl HistoryNode {
    pub const DEFAULT_NAME: &'static str = "history_manager";

    pub fn new(window: HistoryWindow) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            window,
        }
    }
}

#[async_trait]
impl Node for HistoryNode {
    async fn execute(&self, state: &GraphState) -> Result<StateUpdate> {
        let history = self.window.apply(&state.messages);
        tracing::debug!(
            messages = state.messages.len(),
            history = history.len(),
            history_len = self.window.history_len(),
            "History window applied"
        );
        Ok(StateUpdate::history(history))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_llm::{Message, ToolCall};

    #[tokio::test]
    async fn test_update_replaces_history_and_keeps_messages() {
        let messages = vec![
            Message::human("what is 2+2"),
            Message::ai_with_tools(vec![ToolCall::new("c1", "calculate", r#"{"text":"2+2"}"#)]),
            Message::tool_result("c1", "4"),
            Message::ai("4"),
            Message::human("thanks"),
        ];
        let mut state = GraphState::new("t1", messages.clone());

        let node = HistoryNode::new(HistoryWindow::new(2));
        let update = node.execute(&state).await.unwrap();
        assert!(update.messages.is_empty());

        state.apply(update);
        assert_eq!(state.messages, messages);
        assert_eq!(state.history, vec![Message::ai("4"), Message::human("thanks")]);
        assert_eq!(node.name(), "history_manager");
    }
}
