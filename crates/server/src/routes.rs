//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Read path
        .route("/list", get(handlers::list_dir))
        .route("/download", get(handlers::download))
        .route("/info", get(handlers::info))
        // Upload protocol: open session, apply chunks, complete
        .route(
            "/upload",
            post(handlers::upload_begin)
                .patch(handlers::upload_chunk)
                .put(handlers::upload_complete),
        )
        // Tree management
        .route("/mkdir", post(handlers::mkdir))
        .route("/rename", put(handlers::rename))
        .route("/delete", delete(handlers::delete))
        .route("/rmdir", delete(handlers::rmdir))
        // Unmatched routes return the JSON 404 envelope
        .fallback(handlers::route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
