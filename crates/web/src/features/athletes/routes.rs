use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    create_athlete, delete_athlete, delete_athletes, get_stats, list_athletes, update_athlete,
};
use crate::middleware::auth::{require_session, require_writes_enabled};
use crate::state::AppState;

/// Mounted at `/api`; athlete paths carry their own prefix so `/stats` sits beside them.
pub fn routes(state: AppState) -> Router<AppState> {
    let writes = Router::new()
        .route("/athletes", post(create_athlete))
        .route("/athletes/delete", post(delete_athletes))
        .route("/athletes/:id", put(update_athlete).delete(delete_athlete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_writes_enabled,
        ));

    Router::new()
        .route("/athletes", get(list_athletes))
        .route("/stats", get(get_stats))
        .merge(writes)
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
