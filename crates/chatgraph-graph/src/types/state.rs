use chatgraph_llm::{Message, ToolCall};
use serde::{Deserialize, Serialize};

/// State of one conversation turn.
///
/// `messages` is the authoritative, append-only log and the only part that is
/// checkpointed. `history` is a disposable view recomputed every turn by the
/// history window and must never be persisted or replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphState {
    pub thread_id: String,
    pub run_id: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub history: Vec<Message>,
}

impl GraphState {
    pub fn new(thread_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
            messages,
            history: Vec::new(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn has_pending_tool_calls(&self) -> bool {
        self.last_message().is_some_and(Message::has_tool_calls)
    }

    pub fn get_pending_tool_calls(&self) -> Vec<ToolCall> {
        self.last_message()
            .map(|msg| msg.tool_calls().to_vec())
            .unwrap_or_default()
    }

    /// Tool results at the tail of the log, in order
    pub fn trailing_tool_results(&self) -> &[Message] {
        let start = self
            .messages
            .iter()
            .rposition(|msg| !matches!(msg, Message::Tool { .. }))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        &self.messages[start..]
    }

    /// Most recent user message, if any
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|msg| matches!(msg, Message::Human { .. }))
    }

    /// Apply a node's partial update: append messages, replace history if given
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(history) = update.history {
            self.history = history;
        }
    }
}

/// Partial state returned by a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,
}

impl StateUpdate {
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            history: None,
        }
    }

    pub fn history(history: Vec<Message>) -> Self {
        Self {
            messages: Vec::new(),
            history: Some(history),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.history.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_llm::ToolCall;

    #[test]
    fn test_pending_tool_calls() {
        let call = ToolCall::new("call_1", "calculate", "{}");
        let mut state = GraphState::new("t1", vec![Message::human("hi")]);
        assert!(!state.has_pending_tool_calls());

        state.add_message(Message::ai_with_tools(vec![call.clone()]));
        assert!(state.has_pending_tool_calls());
        assert_eq!(state.get_pending_tool_calls(), vec![call]);
    }

    #[test]
    fn test_trailing_tool_results() {
        let state = GraphState::new(
            "t1",
            vec![
                Message::human("hi"),
                Message::ai_with_tools(vec![
                    ToolCall::new("a", "calculate", "{}"),
                    ToolCall::new("b", "current_time", "{}"),
                ]),
                Message::tool_result("a", "2"),
                Message::tool_result("b", "noon"),
            ],
        );

        let results = state.trailing_tool_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Message::tool_result("a", "2"));

        let no_tools = GraphState::new("t1", vec![Message::human("hi")]);
        assert!(no_tools.trailing_tool_results().is_empty());
    }

    #[test]
    fn test_apply_appends_and_replaces_history() {
        let mut state = GraphState::new("t1", vec![Message::human("hi")]);
        state.apply(StateUpdate::history(vec![Message::human("hi")]));
        state.apply(StateUpdate::messages(vec![Message::ai("hello")]));

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.history, vec![Message::human("hi")]);
    }

    #[test]
    fn test_history_is_not_serialized_when_update_has_none() {
        let update = StateUpdate::messages(vec![Message::ai("ok")]);
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("history").is_none());
    }
}
