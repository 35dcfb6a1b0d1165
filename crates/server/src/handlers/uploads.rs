//! Upload protocol handlers.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{decode_path_param, require_u64_param};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, Request, State};
use shelf_core::types::{Empty, UploadStarted};
use std::collections::HashMap;

/// POST /upload - Open an upload session.
///
/// Opens the destination write handle first; the cookie is only allocated
/// once the backend accepts the path.
#[tracing::instrument(skip(state, params), fields(path, size))]
pub async fn upload_begin(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<UploadStarted>> {
    let path = decode_path_param(&params, "path")?;
    let size = require_u64_param(&params, "size")?;
    tracing::Span::current().record("path", path.as_str());
    tracing::Span::current().record("size", size);

    let handle = state.storage.open_write(&path).await?;
    let cookie = state.uploads.begin(size, handle).await;
    Ok(Json(UploadStarted { cookie }))
}

/// PATCH /upload - Apply one chunk to an open session.
///
/// The raw request body is the chunk; an empty body marks the end of the
/// stream. Bodies over the configured maximum chunk size are rejected.
#[tracing::instrument(skip(state, params, req), fields(cookie, offset))]
pub async fn upload_chunk(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    req: Request,
) -> ApiResult<Json<Empty>> {
    let cookie = require_u64_param(&params, "cookie")?;
    let offset = require_u64_param(&params, "offset")?;
    tracing::Span::current().record("cookie", cookie);
    tracing::Span::current().record("offset", offset);

    let limit = state.config.server.max_chunk_size as usize;
    let data = axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read chunk body: {e}")))?;

    state.uploads.write_chunk(cookie, offset, data).await?;
    Ok(Json(Empty {}))
}

/// PUT /upload - Complete an upload session, moving the staged file into
/// place.
#[tracing::instrument(skip(state, params), fields(cookie))]
pub async fn upload_complete(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Empty>> {
    let cookie = require_u64_param(&params, "cookie")?;
    tracing::Span::current().record("cookie", cookie);

    state.uploads.complete(cookie).await?;
    Ok(Json(Empty {}))
}
