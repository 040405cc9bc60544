pub mod chat;
pub mod graphs;
pub mod health;
pub mod threads;
pub mod tools;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Envelope shared by the listing and tool endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BaseResponse {
    pub code: u16,
    pub msg: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

impl BaseResponse {
    pub fn success(data: Value) -> Self {
        Self {
            code: 200,
            msg: "success".to_string(),
            data,
        }
    }

    pub fn error(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: Value::Null,
        }
    }
}
