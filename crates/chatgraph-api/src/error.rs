use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chatgraph_graph::{HistoryError, RegistryError, ToolError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Graph execution error: {0:#}")]
    Graph(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::History(_) => StatusCode::BAD_REQUEST,
            ApiError::Registry(RegistryError::UnknownLabel(_)) => StatusCode::BAD_REQUEST,
            ApiError::Registry(RegistryError::DuplicateGraph(_)) => StatusCode::CONFLICT,
            ApiError::Registry(_) => StatusCode::NOT_FOUND,
            ApiError::Tool(ToolError::NotFound(_)) => StatusCode::BAD_REQUEST,
            ApiError::Tool(_) | ApiError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
