//! Directory and file management handlers.

use crate::error::ApiResult;
use crate::handlers::common::decode_path_param;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use shelf_core::types::{DirectoryListing, Empty, InfoResponse};
use shelf_storage::StorageBackendExt;
use std::collections::HashMap;

/// GET /list - List one directory level.
#[tracing::instrument(skip(state, params), fields(path))]
pub async fn list_dir(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<DirectoryListing>> {
    let path = decode_path_param(&params, "path")?;
    tracing::Span::current().record("path", path.as_str());

    let listing = state.storage.list(&path).await?;
    Ok(Json(listing))
}

/// GET /info - Backend display name.
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: state.storage.display_name().to_string(),
    })
}

/// POST /mkdir - Create a directory. The parent must already exist.
#[tracing::instrument(skip(state, params), fields(path))]
pub async fn mkdir(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Empty>> {
    let path = decode_path_param(&params, "path")?;
    tracing::Span::current().record("path", path.as_str());

    state.storage.make_dir(&path).await?;
    Ok(Json(Empty {}))
}

/// PUT /rename - Rename a file or directory.
#[tracing::instrument(skip(state, params), fields(path, to))]
pub async fn rename(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Empty>> {
    let path = decode_path_param(&params, "path")?;
    let to = decode_path_param(&params, "to")?;
    tracing::Span::current().record("path", path.as_str());
    tracing::Span::current().record("to", to.as_str());

    state.storage.rename(&path, &to).await?;
    Ok(Json(Empty {}))
}

/// DELETE /delete - Remove a file.
#[tracing::instrument(skip(state, params), fields(path))]
pub async fn delete(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Empty>> {
    let path = decode_path_param(&params, "path")?;
    tracing::Span::current().record("path", path.as_str());

    state.storage.remove_file(&path).await?;
    Ok(Json(Empty {}))
}

/// DELETE /rmdir - Remove a directory subtree.
#[tracing::instrument(skip(state, params), fields(path))]
pub async fn rmdir(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Empty>> {
    let path = decode_path_param(&params, "path")?;
    tracing::Span::current().record("path", path.as_str());

    state.storage.remove_tree(&path).await?;
    Ok(Json(Empty {}))
}
