use crate::types::StateUpdate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emitted each time a node finishes: the node name and the partial state it produced.
///
/// The `Display` form is the wire representation forwarded to clients:
/// a compact JSON object `{"<node>": <update>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEvent {
    pub node: String,
    pub update: StateUpdate,
}

impl GraphEvent {
    pub fn new(node: impl Into<String>, update: StateUpdate) -> Self {
        Self {
            node: node.into(),
            update,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert(self.node.clone(), serde_json::to_value(&self.update)?);
        Ok(serde_json::Value::Object(map))
    }
}

impl fmt::Display for GraphEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_json().map_err(|_| fmt::Error)?;
        write!(f, "{}", value)
    }
}
