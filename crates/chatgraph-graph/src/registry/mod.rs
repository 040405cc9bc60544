//! Graph blueprints and the registry the API resolves them from.
//!
//! A blueprint knows how to assemble one kind of graph from a [`BuildContext`];
//! the registry is built once at startup and shared read-only afterwards.

mod chatbot;
mod text_to_sql;

pub use chatbot::ChatbotGraph;
pub use text_to_sql::{TextToSqlGraph, DEFAULT_SCHEMA};

use crate::checkpoint::Checkpointer;
use crate::graph::CompiledGraph;
use crate::history::HistoryWindow;
use crate::tools::ToolRegistry;
use crate::types::{GraphConfig, GraphEvent, LlmConfig};
use anyhow::Result;
use chatgraph_llm::{ChatClient, Message};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("graph '{0}' is already registered")]
    DuplicateGraph(String),

    #[error("graph '{0}' not found")]
    GraphNotFound(String),

    #[error("unknown graph label '{0}'")]
    UnknownLabel(String),

    #[error("No graph found with title '{title}' for label '{label}'")]
    TitleNotFound { label: GraphLabel, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphLabel {
    Agent,
    Rag,
}

impl GraphLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Rag => "rag",
        }
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphLabel {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Self::Agent),
            "rag" => Ok(Self::Rag),
            _ => Err(RegistryError::UnknownLabel(s.to_string())),
        }
    }
}

/// Everything a blueprint needs to assemble a graph for one request
#[derive(Clone)]
pub struct BuildContext {
    pub client: Arc<dyn ChatClient>,
    /// Tools the request asked for
    pub tools: Arc<ToolRegistry>,
    pub llm: LlmConfig,
    pub window: HistoryWindow,
    pub graph: GraphConfig,
    pub checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl BuildContext {
    pub fn new(client: Arc<dyn ChatClient>, llm: LlmConfig) -> Self {
        Self {
            client,
            tools: Arc::new(ToolRegistry::new()),
            llm,
            window: HistoryWindow::default(),
            graph: GraphConfig::default(),
            checkpointer: None,
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_graph_config(mut self, graph: GraphConfig) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }
}

/// One kind of conversation graph
pub trait GraphBlueprint: Send + Sync {
    fn name(&self) -> &str;
    fn label(&self) -> GraphLabel;
    fn title(&self) -> &str;
    fn description(&self) -> &str;

    fn build(&self, ctx: &BuildContext) -> Result<CompiledGraph>;

    /// Message to show for an event, if any
    fn handle_event(&self, event: &GraphEvent) -> Option<Message> {
        event.update.messages.last().cloned()
    }

    fn descriptor(&self) -> GraphDescriptor {
        GraphDescriptor {
            name: self.name().to_string(),
            label: self.label(),
            title: self.title().to_string(),
            description: self.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    pub name: String,
    pub label: GraphLabel,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Default)]
pub struct GraphRegistry {
    graphs: BTreeMap<String, Arc<dyn GraphBlueprint>>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in graphs
    pub fn builtin(sql_schema: impl Into<String>) -> Self {
        let blueprints: [Arc<dyn GraphBlueprint>; 2] = [
            Arc::new(ChatbotGraph),
            Arc::new(TextToSqlGraph::new(sql_schema)),
        ];
        Self {
            graphs: blueprints
                .into_iter()
                .map(|bp| (bp.name().to_string(), bp))
                .collect(),
        }
    }

    pub fn register(&mut self, blueprint: Arc<dyn GraphBlueprint>) -> Result<(), RegistryError> {
        let name = blueprint.name().to_string();
        if self.graphs.contains_key(&name) {
            return Err(RegistryError::DuplicateGraph(name));
        }
        tracing::debug!(graph = %name, label = %blueprint.label(), "Registered graph");
        self.graphs.insert(name, blueprint);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn GraphBlueprint>, RegistryError> {
        self.graphs
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::GraphNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.graphs.keys().cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<dyn GraphBlueprint>> {
        self.graphs.values()
    }

    /// Descriptors, optionally restricted to one label
    pub fn list(&self, label: Option<GraphLabel>) -> Vec<GraphDescriptor> {
        self.entries()
            .filter(|bp| label.map_or(true, |l| bp.label() == l))
            .map(|bp| bp.descriptor())
            .collect()
    }

    pub fn list_titles(&self, label: GraphLabel) -> Vec<String> {
        self.entries()
            .filter(|bp| bp.label() == label)
            .map(|bp| bp.title().to_string())
            .collect()
    }

    pub fn find_by_title(&self, label: GraphLabel, title: &str) -> Result<Arc<dyn GraphBlueprint>, RegistryError> {
        self.entries()
            .find(|bp| bp.label() == label && bp.title() == title)
            .cloned()
            .ok_or_else(|| RegistryError::TitleNotFound {
                label,
                title: title.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl fmt::Debug for GraphRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphRegistry")
            .field("graphs", &self.names())
            .finish()
    }
}
