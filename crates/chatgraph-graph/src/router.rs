use crate::types::GraphState;

/// Name of the virtual terminal node
pub const END: &str = "__end__";

/// Decides which node runs next based on the current state
pub trait Router: Send + Sync {
    fn next(&self, state: &GraphState) -> NextNode;
}

#[derive(Debug, Clone, PartialEq)]
pub enum NextNode {
    Node(String),
    End,
}

impl NextNode {
    pub fn named(name: &str) -> Self {
        if name == END {
            Self::End
        } else {
            Self::Node(name.to_string())
        }
    }
}

/// Routes to the tool node when the last message requests tools, otherwise ends the turn
pub struct ToolsCondition {
    tools_node: String,
}

impl ToolsCondition {
    pub fn new(tools_node: impl Into<String>) -> Self {
        Self {
            tools_node: tools_node.into(),
        }
    }
}

impl Default for ToolsCondition {
    fn default() -> Self {
        Self::new("tools")
    }
}

impl Router for ToolsCondition {
    fn next(&self, state: &GraphState) -> NextNode {
        if state.has_pending_tool_calls() {
            NextNode::Node(self.tools_node.clone())
        } else {
            NextNode::End
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_llm::{Message, ToolCall};

    #[test]
    fn test_tools_condition() {
        let router = ToolsCondition::default();
        let mut state = GraphState::new("t1", vec![Message::human("hi"), Message::ai("hello")]);
        assert_eq!(router.next(&state), NextNode::End);

        state.add_message(Message::ai_with_tools(vec![ToolCall::new("c1", "calculate", "{}")]));
        assert_eq!(router.next(&state), NextNode::Node("tools".to_string()));
    }

    #[test]
    fn test_named_end() {
        assert_eq!(NextNode::named(END), NextNode::End);
        assert_eq!(NextNode::named("chatbot"), NextNode::Node("chatbot".to_string()));
    }
}
