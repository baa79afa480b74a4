use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};

use super::handlers::{commit, discard, download_template, preview, upload};
use super::services::MAX_UPLOAD_BYTES;
use crate::middleware::auth::{require_session, require_writes_enabled};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let writes = Router::new()
        .route("/", post(upload))
        .route("/preview", post(preview))
        .route("/commit", post(commit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_writes_enabled,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let protected = Router::new()
        .route("/pending", delete(discard))
        .merge(writes)
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/template", get(download_template))
        .merge(protected)
}
