use anyhow::Result;
use async_trait::async_trait;
use crate::types::{GraphState, StateUpdate};

/// A named unit of work in a conversation graph.
///
/// Nodes read the current state and return a partial update; the runner
/// applies the update only once the node has succeeded, so a failing node
/// never leaves the state half-modified.
#[async_trait]
pub trait Node: Send + Sync {
    async fn execute(&self, state: &GraphState) -> Result<StateUpdate>;

    fn name(&self) -> &str;
}
