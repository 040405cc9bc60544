pub mod state;
pub mod config;
pub mod events;

pub use state::{GraphState, StateUpdate};
pub use config::{GraphConfig, LlmConfig};
pub use events::GraphEvent;
