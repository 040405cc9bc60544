use crate::node::Node;
use crate::tools::ToolRegistry;
use crate::types::{GraphState, StateUpdate};
use anyhow::Result;
use async_trait::async_trait;
use chatgraph_llm::{Message, ToolCall};
use std::sync::Arc;
use std::time::Instant;

/// Runs every tool call requested by the last assistant message.
///
/// A failing tool does not fail the turn: the error text becomes the tool
/// result, so the model can see it and recover.
pub struct ToolNode {
    name: String,
    tools: Arc<ToolRegistry>,
}

impl ToolNode {
    pub const DEFAULT_NAME: &'static str = "tools";

    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            tools,
        }
    }

    async fn run_call(&self, call: &ToolCall) -> Message {
        let start = Instant::now();
        let name = call.function.name.as_str();

        let outcome = match call.arguments_value() {
            Ok(args) => self.tools.call(name, args).await.map_err(anyhow::Error::from),
            Err(e) => Err(anyhow::anyhow!("invalid arguments for '{}': {}", name, e)),
        };

        let content = match outcome {
            Ok(output) => {
                tracing::info!(
                    tool = name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool executed"
                );
                output
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %format!("{:#}", e), "Tool execution failed");
                format!("Tool execution failed: {:#}", e)
            }
        };

        Message::tool_result(call.id.clone(), content)
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn execute(&self, state: &GraphState) -> Result<StateUpdate> {
        let calls = state.get_pending_tool_calls();
        let mut results = Vec::with_capacity(calls.len());

        for call in &calls {
            results.push(self.run_call(call).await);
        }

        Ok(StateUpdate::messages(results))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_calls(calls: Vec<ToolCall>) -> GraphState {
        GraphState::new(
            "t1",
            vec![Message::human("go"), Message::ai_with_tools(calls)],
        )
    }

    #[tokio::test]
    async fn test_executes_each_call_in_order() {
        let node = ToolNode::new(Arc::new(ToolRegistry::builtin()));
        let state = state_with_calls(vec![
            ToolCall::new("a", "calculate", r#"{"text": "6 * 7"}"#),
            ToolCall::new("b", "calculate", r#"{"text": "1 + 1"}"#),
        ]);

        let update = node.execute(&state).await.unwrap();

        assert_eq!(
            update.messages,
            vec![Message::tool_result("a", "42"), Message::tool_result("b", "2")]
        );
        assert!(update.history.is_none());
    }

    #[tokio::test]
    async fn test_failures_become_results() {
        let node = ToolNode::new(Arc::new(ToolRegistry::builtin()));
        let state = state_with_calls(vec![
            ToolCall::new("a", "weather", "{}"),
            ToolCall::new("b", "calculate", "not json"),
        ]);

        let update = node.execute(&state).await.unwrap();

        assert_eq!(
            update.messages[0].text(),
            "Tool execution failed: no tool named 'weather'"
        );
        assert!(update.messages[1].text().starts_with("Tool execution failed: invalid arguments"));
    }

    #[tokio::test]
    async fn test_no_pending_calls() {
        let node = ToolNode::new(Arc::new(ToolRegistry::builtin()));
        let state = GraphState::new("t1", vec![Message::human("hi")]);

        let update = node.execute(&state).await.unwrap();
        assert!(update.is_empty());
    }
}
