use crate::checkpoint::Checkpointer;
use crate::node::Node;
use crate::router::{NextNode, Router, END};
use crate::types::{GraphConfig, GraphEvent, GraphState};
use anyhow::{anyhow, bail, Context, Result};
use async_stream::try_stream;
use chatgraph_llm::Message;
use futures::{Stream, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Outgoing edge of a node
#[derive(Clone)]
pub enum Edge {
    To(String),
    End,
    Conditional(Arc<dyn Router>),
}

/// Builder for a node/edge graph
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    duplicates: Vec<String>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, node: Arc<dyn Node>) -> Self {
        let name = node.name().to_string();
        if self.nodes.insert(name.clone(), node).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Unconditional edge; `to` may be [`END`]
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let to = to.into();
        let edge = if to == END { Edge::End } else { Edge::To(to) };
        self.edges.insert(from.into(), edge);
        self
    }

    pub fn add_conditional_edges(mut self, from: impl Into<String>, router: Arc<dyn Router>) -> Self {
        self.edges.insert(from.into(), Edge::Conditional(router));
        self
    }

    pub fn set_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Persist `messages` after every node that appends to them
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn compile(self, config: GraphConfig) -> Result<CompiledGraph> {
        if let Some(name) = self.duplicates.first() {
            bail!("Node '{}' is defined more than once", name);
        }
        if config.max_iterations == 0 {
            bail!("max_iterations must be at least 1");
        }

        let entry = self.entry.ok_or_else(|| anyhow!("Graph has no entry point"))?;
        if !self.nodes.contains_key(&entry) {
            bail!("Entry point '{}' is not a node", entry);
        }

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                bail!("Edge starts at unknown node '{}'", from);
            }
            if let Edge::To(to) = edge {
                if !self.nodes.contains_key(to) {
                    bail!("Edge '{}' -> '{}' targets an unknown node", from, to);
                }
            }
        }
        for name in self.nodes.keys() {
            if !self.edges.contains_key(name) {
                bail!("Node '{}' has no outgoing edge", name);
            }
        }

        Ok(CompiledGraph {
            inner: Arc::new(GraphInner {
                nodes: self.nodes,
                edges: self.edges,
                entry,
                config,
                checkpointer: self.checkpointer,
            }),
        })
    }
}

struct GraphInner {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: String,
    config: GraphConfig,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl GraphInner {
    fn route(&self, from: &str, state: &GraphState) -> NextNode {
        match self.edges.get(from) {
            Some(Edge::To(to)) => NextNode::Node(to.clone()),
            Some(Edge::Conditional(router)) => router.next(state),
            Some(Edge::End) | None => NextNode::End,
        }
    }

    /// Execute one node, apply its update and pick the next node.
    /// The state is only modified when the node succeeds.
    async fn step(&self, state: &mut GraphState, name: &str) -> Result<(GraphEvent, NextNode)> {
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| anyhow!("Node '{}' not found", name))?;

        let start = Instant::now();
        let update = node
            .execute(state)
            .await
            .with_context(|| format!("Node '{}' failed", name))?;

        tracing::debug!(
            node = name,
            run_id = %state.run_id,
            duration_ms = start.elapsed().as_millis() as u64,
            appended = update.messages.len(),
            "Node completed"
        );

        let event = GraphEvent::new(name, update.clone());
        let appended = !update.messages.is_empty();
        state.apply(update);

        if appended {
            if let Some(checkpointer) = &self.checkpointer {
                checkpointer
                    .save(&state.thread_id, &state.messages)
                    .await
                    .with_context(|| format!("Failed to checkpoint thread '{}'", state.thread_id))?;
            }
        }

        Ok((event, self.route(name, state)))
    }

    fn check_iterations(&self, iterations: usize) -> Result<()> {
        if iterations >= self.config.max_iterations {
            bail!("Max iterations ({}) reached", self.config.max_iterations);
        }
        Ok(())
    }
}

/// Executable graph; cheap to clone
#[derive(Clone)]
pub struct CompiledGraph {
    inner: Arc<GraphInner>,
}

impl CompiledGraph {
    pub fn entry_point(&self) -> &str {
        &self.inner.entry
    }

    pub fn config(&self) -> &GraphConfig {
        &self.inner.config
    }

    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.nodes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Turn state for `thread_id`: checkpointed messages followed by `input`
    pub async fn initial_state(&self, thread_id: &str, input: Vec<Message>) -> Result<GraphState> {
        let mut messages = match &self.inner.checkpointer {
            Some(checkpointer) => checkpointer
                .load(thread_id)
                .await
                .with_context(|| format!("Failed to load thread '{}'", thread_id))?,
            None => Vec::new(),
        };
        messages.extend(input);
        Ok(GraphState::new(thread_id, messages))
    }

    /// Run the graph lazily, one node per poll.
    ///
    /// Each item is the event of a completed node. The stream ends after the
    /// terminal node, or yields a single error and ends when a node fails or
    /// the iteration limit is hit. Dropping the stream stops execution before
    /// the next node starts.
    pub fn stream(&self, state: GraphState) -> impl Stream<Item = Result<GraphEvent>> + Send + 'static {
        let inner = Arc::clone(&self.inner);

        try_stream! {
            let mut state = state;
            let mut current = NextNode::Node(inner.entry.clone());
            let mut iterations = 0usize;

            tracing::info!(thread_id = %state.thread_id, run_id = %state.run_id, "Graph run started");

            while let NextNode::Node(name) = current {
                inner.check_iterations(iterations)?;
                iterations += 1;

                let (event, next) = inner.step(&mut state, &name).await?;
                yield event;
                current = next;
            }

            tracing::info!(
                thread_id = %state.thread_id,
                run_id = %state.run_id,
                iterations,
                messages = state.messages.len(),
                "Graph run finished"
            );
        }
    }

    /// Run to completion; every node's event, in execution order
    pub async fn invoke(&self, state: GraphState) -> Result<Vec<GraphEvent>> {
        self.stream(state).try_collect().await
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry", &self.inner.entry)
            .field("nodes", &self.node_names())
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StateUpdate;
    use async_trait::async_trait;
    use futures::StreamExt;

    struct Echo(&'static str);

    #[async_trait]
    impl Node for Echo {
        async fn execute(&self, _state: &GraphState) -> Result<StateUpdate> {
            Ok(StateUpdate::messages(vec![Message::ai(self.0)]))
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct Failing;

    #[async_trait]
    impl Node for Failing {
        async fn execute(&self, _state: &GraphState) -> Result<StateUpdate> {
            bail!("boom")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_compile_validation() {
        let missing_entry = StateGraph::new().add_node(Arc::new(Echo("a"))).add_edge("a", END);
        assert!(missing_entry.compile(GraphConfig::default()).is_err());

        let dangling = StateGraph::new()
            .add_node(Arc::new(Echo("a")))
            .add_edge("a", "b")
            .set_entry_point("a");
        let err = dangling.compile(GraphConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unknown node"));

        let no_edge = StateGraph::new().add_node(Arc::new(Echo("a"))).set_entry_point("a");
        assert!(no_edge.compile(GraphConfig::default()).is_err());

        let duplicate = StateGraph::new()
            .add_node(Arc::new(Echo("a")))
            .add_node(Arc::new(Echo("a")))
            .add_edge("a", END)
            .set_entry_point("a");
        assert!(duplicate.compile(GraphConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_stream_yields_events_in_order() {
        let graph = StateGraph::new()
            .add_node(Arc::new(Echo("a")))
            .add_node(Arc::new(Echo("b")))
            .add_edge("a", "b")
            .add_edge("b", END)
            .set_entry_point("a")
            .compile(GraphConfig::default())
            .unwrap();

        let state = GraphState::new("t1", vec![Message::human("hi")]);
        let events: Vec<GraphEvent> = graph
            .stream(state)
            .map(|event| event.unwrap())
            .collect()
            .await;

        let nodes: Vec<&str> = events.iter().map(|e| e.node.as_str()).collect();
        assert_eq!(nodes, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let graph = StateGraph::new()
            .add_node(Arc::new(Echo("loop")))
            .add_edge("loop", "loop")
            .set_entry_point("loop")
            .compile(GraphConfig::new().with_max_iterations(3))
            .unwrap();

        let items: Vec<Result<GraphEvent>> =
            graph.stream(GraphState::new("t1", vec![])).collect().await;

        assert_eq!(items.len(), 4);
        assert!(items[..3].iter().all(|item| item.is_ok()));
        let err = items[3].as_ref().unwrap_err();
        assert_eq!(err.to_string(), "Max iterations (3) reached");
    }

    #[tokio::test]
    async fn test_node_failure_ends_stream_with_context() {
        let graph = StateGraph::new()
            .add_node(Arc::new(Echo("a")))
            .add_node(Arc::new(Failing))
            .add_edge("a", "failing")
            .add_edge("failing", END)
            .set_entry_point("a")
            .compile(GraphConfig::default())
            .unwrap();

        let items: Vec<Result<GraphEvent>> =
            graph.stream(GraphState::new("t1", vec![])).collect().await;

        assert_eq!(items.len(), 2);
        let err = items[1].as_ref().unwrap_err();
        assert_eq!(format!("{:#}", err), "Node 'failing' failed: boom");
    }

    #[tokio::test]
    async fn test_invoke_collects_every_event() {
        let graph = StateGraph::new()
            .add_node(Arc::new(Echo("a")))
            .add_node(Arc::new(Echo("b")))
            .add_edge("a", "b")
            .add_edge("b", END)
            .set_entry_point("a")
            .compile(GraphConfig::default())
            .unwrap();

        let events = graph
            .invoke(GraphState::new("t1", vec![Message::human("hi")]))
            .await
            .unwrap();
        let nodes: Vec<&str> = events.iter().map(|e| e.node.as_str()).collect();
        assert_eq!(nodes, vec!["a", "b"]);
        assert_eq!(events[1].update.messages, vec![Message::ai("b")]);

        let failing = StateGraph::new()
            .add_node(Arc::new(Failing))
            .add_edge("failing", END)
            .set_entry_point("failing")
            .compile(GraphConfig::default())
            .unwrap();
        let err = failing
            .invoke(GraphState::new("t1", Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(format!("{:#}", err), "Node 'failing' failed: boom");
    }
}
