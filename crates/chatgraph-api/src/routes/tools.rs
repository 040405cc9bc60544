use axum::{extract::State, Json};
use chatgraph_graph::ToolError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use super::BaseResponse;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub tool_input: Value,
}

/// List available tools keyed by name
#[utoipa::path(
    get,
    path = "/tools",
    responses(
        (status = 200, description = "Tool descriptions", body = BaseResponse)
    ),
    tag = "tools"
)]
pub async fn list_tools(State(state): State<Arc<AppState>>) -> ApiResult<Json<BaseResponse>> {
    let mut data = Map::new();
    for info in state.tools.list() {
        let name = info.name.clone();
        data.insert(name, serde_json::to_value(info).map_err(anyhow::Error::from)?);
    }

    Ok(Json(BaseResponse::success(Value::Object(data))))
}

/// Invoke a tool directly
///
/// Failures are reported in the envelope (`code: 500`) rather than the HTTP status.
#[utoipa::path(
    post,
    path = "/tools/call",
    request_body = CallToolRequest,
    responses(
        (status = 200, description = "Tool output or failure", body = BaseResponse)
    ),
    tag = "tools"
)]
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CallToolRequest>,
) -> Json<BaseResponse> {
    match state.tools.call(&req.name, req.tool_input).await {
        Ok(output) => Json(BaseResponse::success(Value::String(output))),
        Err(e) => {
            match &e {
                ToolError::Failed { source, .. } => {
                    tracing::error!(tool = %req.name, error = %format!("{:#}", source), "Tool call failed");
                }
                _ => tracing::error!(tool = %req.name, error = %e, "Tool call failed"),
            }
            Json(BaseResponse::error(500, e.to_string()))
        }
    }
}
