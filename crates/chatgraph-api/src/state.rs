use crate::config::Config;
use chatgraph_graph::{ChatClient, Checkpointer, GraphRegistry, MemoryCheckpointer, ToolRegistry};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state passed to all handlers
///
/// Registries are built once at startup and only read afterwards.
/// `shutdown` is the parent of every streaming turn's cancellation token.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub graphs: Arc<GraphRegistry>,
    pub tools: Arc<ToolRegistry>,
    pub llm_client: Arc<dyn ChatClient>,
    pub checkpointer: Arc<dyn Checkpointer>,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// State with the built-in graphs and tools and an in-memory checkpointer
    pub fn new(config: Config, llm_client: Arc<dyn ChatClient>) -> Self {
        let graphs = GraphRegistry::builtin(config.text_to_sql.schema.clone());

        Self {
            config: Arc::new(config),
            graphs: Arc::new(graphs),
            tools: Arc::new(ToolRegistry::builtin()),
            llm_client,
            checkpointer: Arc::new(MemoryCheckpointer::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = checkpointer;
        self
    }
}
