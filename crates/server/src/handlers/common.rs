//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;

/// Decode a base64 logical path query parameter.
///
/// A missing parameter decodes to the empty logical path (the backend
/// root).
pub fn decode_path_param(params: &HashMap<String, String>, key: &str) -> ApiResult<String> {
    let Some(encoded) = params.get(key) else {
        return Ok(String::new());
    };
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 in '{key}': {e}")))?;
    String::from_utf8(bytes).map_err(|e| ApiError::BadRequest(format!("invalid UTF-8 in '{key}': {e}")))
}

/// Parse a required unsigned integer query parameter.
pub fn require_u64_param(params: &HashMap<String, String>, key: &str) -> ApiResult<u64> {
    let value = params
        .get(key)
        .ok_or_else(|| ApiError::BadRequest(format!("missing parameter '{key}'")))?;
    value.parse().map_err(|_| {
        ApiError::BadRequest(format!("parameter '{key}' must be a non-negative integer"))
    })
}

/// Fallback for unmatched routes.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
