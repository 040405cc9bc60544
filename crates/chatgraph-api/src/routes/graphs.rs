use axum::{
    extract::{Query, State},
    Json,
};
use chatgraph_graph::GraphLabel;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use super::BaseResponse;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListGraphsQuery {
    /// `agent` or `rag`
    pub label: Option<String>,
}

/// List registered graphs, optionally by label
#[utoipa::path(
    get,
    path = "/graphs",
    params(ListGraphsQuery),
    responses(
        (status = 200, description = "Graph descriptors", body = BaseResponse),
        (status = 400, description = "Unknown label")
    ),
    tag = "graphs"
)]
pub async fn list_graphs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListGraphsQuery>,
) -> ApiResult<Json<BaseResponse>> {
    let label = query
        .label
        .as_deref()
        .map(str::parse::<GraphLabel>)
        .transpose()?;

    let graphs = state.graphs.list(label);
    let data = serde_json::to_value(graphs).map_err(anyhow::Error::from)?;

    Ok(Json(BaseResponse::success(data)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TitlesQuery {
    /// `agent` or `rag`
    pub label: String,
}

/// Display titles of the graphs under one label
#[utoipa::path(
    get,
    path = "/graphs/titles",
    params(TitlesQuery),
    responses(
        (status = 200, description = "Graph titles", body = BaseResponse),
        (status = 400, description = "Unknown label")
    ),
    tag = "graphs"
)]
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TitlesQuery>,
) -> ApiResult<Json<BaseResponse>> {
    let label: GraphLabel = query.label.parse()?;
    let titles = state.graphs.list_titles(label);

    Ok(Json(BaseResponse::success(serde_json::json!(titles))))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FindByTitleQuery {
    pub label: String,
    pub title: String,
}

/// Resolve a graph from the label and title a client displays
#[utoipa::path(
    get,
    path = "/graphs/by-title",
    params(FindByTitleQuery),
    responses(
        (status = 200, description = "Graph descriptor", body = BaseResponse),
        (status = 400, description = "Unknown label"),
        (status = 404, description = "No graph with that title")
    ),
    tag = "graphs"
)]
pub async fn find_by_title(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FindByTitleQuery>,
) -> ApiResult<Json<BaseResponse>> {
    let label: GraphLabel = query.label.parse()?;
    let blueprint = state.graphs.find_by_title(label, &query.title)?;
    let data = serde_json::to_value(blueprint.descriptor()).map_err(anyhow::Error::from)?;

    Ok(Json(BaseResponse::success(data)))
}
