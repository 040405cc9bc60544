use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

/// Forget a thread's checkpointed messages
#[utoipa::path(
    delete,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 204, description = "Thread deleted, or it never existed")
    ),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.checkpointer.delete(&thread_id).await?;
    tracing::info!(thread_id = %thread_id, "Thread deleted");

    Ok(StatusCode::NO_CONTENT)
}
