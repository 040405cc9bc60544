//! Tools the model may call, and the registry graphs and the API resolve them from.

mod calculate;
mod current_time;

pub use calculate::Calculate;
pub use current_time::CurrentTime;

use async_trait::async_trait;
use chatgraph_llm::Tool;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no tool named '{0}'")]
    NotFound(String),

    #[error("failed to call tool '{name}'")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("tool '{0}' is already registered")]
    Duplicate(String),
}

/// A callable tool exposed to the model and to `/tools/call`
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable name
    fn title(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str;

    /// JSON schema of the tool input
    fn args(&self) -> Value;

    /// Static tool configuration shown in listings
    fn config(&self) -> Value {
        Value::Object(Default::default())
    }

    async fn invoke(&self, input: Value) -> anyhow::Result<String>;

    /// Schema advertised to the model
    fn schema(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.args())
    }
}

/// Listing entry for a registered tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub args: Value,
    pub config: Value,
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in tools
    pub fn builtin() -> Self {
        let tools: [Arc<dyn AgentTool>; 2] = [Arc::new(Calculate), Arc::new(CurrentTime)];
        Self {
            tools: tools
                .into_iter()
                .map(|tool| (tool.name().to_string(), tool))
                .collect(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn AgentTool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools
            .values()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                title: tool.title().to_string(),
                description: tool.description().to_string(),
                args: tool.args(),
                config: tool.config(),
            })
            .collect()
    }

    /// Registry restricted to `names`; every name must exist
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, ToolError> {
        let mut tools = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let tool = self
                .get(name)
                .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
            tools.insert(name.to_string(), tool);
        }
        Ok(Self { tools })
    }

    /// LLM tool definitions, ordered by name
    pub fn schemas(&self) -> Vec<Tool> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    pub async fn call(&self, name: &str, input: Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tool.invoke(input).await.map_err(|source| ToolError::Failed {
            name: name.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_registry() {
        let registry = ToolRegistry::builtin();
        assert_eq!(registry.names(), vec!["calculate", "current_time"]);

        let schemas = registry.schemas();
        assert_eq!(schemas[0].function.name, "calculate");
        assert_eq!(schemas[0].tool_type, "function");
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ToolRegistry::builtin();
        let err = registry.register(Arc::new(Calculate)).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(name) if name == "calculate"));
    }

    #[test]
    fn test_subset() {
        let registry = ToolRegistry::builtin();

        let subset = registry.subset(&["calculate"]).unwrap();
        assert_eq!(subset.names(), vec!["calculate"]);

        let err = registry.subset(&["weather"]).unwrap_err();
        assert_eq!(err.to_string(), "no tool named 'weather'");

        let empty: &[&str] = &[];
        assert!(registry.subset(empty).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_call() {
        let registry = ToolRegistry::builtin();

        let result = registry.call("calculate", json!({"text": "2 * (3 + 4)"})).await.unwrap();
        assert_eq!(result, "14");

        let err = registry.call("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));

        let err = registry.call("calculate", json!({"text": "1 / 0"})).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to call tool 'calculate'"));
    }
}
