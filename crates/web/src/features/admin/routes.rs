use axum::{Router, middleware, routing::get};

use super::handlers::{get_stats, list_athletes, list_coaches};
use crate::middleware::auth::{require_admin, require_session};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/athletes", get(list_athletes))
        .route("/coaches", get(list_coaches))
        .route("/stats", get(get_stats))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
