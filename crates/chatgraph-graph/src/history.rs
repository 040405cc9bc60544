//! History windowing: decides which prior messages are forwarded to the model.
//!
//! The window drops excluded message kinds (tool results by default), drops
//! assistant messages that only carry pending tool-call requests, and keeps the
//! last `history_len` survivors in their original order.

use chatgraph_llm::{Message, MessageKind};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HistoryError {
    #[error("Filtering messages error: unknown message kind '{0}'")]
    UnknownKind(String),

    #[error("Filtering messages error: history length must be non-negative, got {0}")]
    NegativeLength(i64),
}

/// Bounded, filtered view over a conversation's message log
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWindow {
    history_len: usize,
    exclude: HashSet<MessageKind>,
}

impl HistoryWindow {
    /// Window of `history_len` entries excluding tool results
    pub fn new(history_len: usize) -> Self {
        Self {
            history_len,
            exclude: HashSet::from([MessageKind::Tool]),
        }
    }

    /// Replace the excluded kinds
    pub fn excluding(mut self, kinds: impl IntoIterator<Item = MessageKind>) -> Self {
        self.exclude = kinds.into_iter().collect();
        self
    }

    /// Build a window from untyped input (request bodies, config files).
    ///
    /// An empty `exclude` keeps the default exclusion of tool results.
    pub fn parse<S: AsRef<str>>(history_len: i64, exclude: &[S]) -> Result<Self, HistoryError> {
        let history_len =
            usize::try_from(history_len).map_err(|_| HistoryError::NegativeLength(history_len))?;
        let window = Self::new(history_len);
        if exclude.is_empty() {
            return Ok(window);
        }

        let kinds = exclude
            .iter()
            .map(|name| {
                name.as_ref()
                    .parse::<MessageKind>()
                    .map_err(|_| HistoryError::UnknownKind(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(window.excluding(kinds))
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn excludes(&self, kind: MessageKind) -> bool {
        self.exclude.contains(&kind)
    }

    fn keeps(&self, message: &Message) -> bool {
        if self.excludes(message.kind()) {
            return false;
        }
        // Dropped even when the assistant message also carries text
        !message.has_tool_calls()
    }

    /// Filter then keep the most recent `history_len` survivors
    pub fn apply(&self, messages: &[Message]) -> Vec<Message> {
        let filtered: Vec<&Message> = messages.iter().filter(|m| self.keeps(m)).collect();
        let start = filtered.len().saturating_sub(self.history_len);
        filtered[start..].iter().map(|m| (*m).clone()).collect()
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(3)
    }
}
