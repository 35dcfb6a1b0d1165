//! Download streaming handler.

use crate::error::ApiResult;
use crate::handlers::common::decode_path_param;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use std::collections::HashMap;

/// GET /download - Stream a file in bounded-size chunks.
///
/// The response carries no Content-Length, so the transfer is framed with
/// standard chunked encoding. The Content-Type is guessed from the file
/// extension, falling back to application/octet-stream.
#[tracing::instrument(skip(state, params), fields(path))]
pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let path = decode_path_param(&params, "path")?;
    tracing::Span::current().record("path", path.as_str());

    let stream = state.storage.read_stream(&path).await?;
    let body_stream = stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, mime.essence_str())],
        Body::from_stream(body_stream),
    )
        .into_response())
}
