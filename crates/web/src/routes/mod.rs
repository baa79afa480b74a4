use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::features;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(features::auth::routes::routes(state.clone()))
        .merge(features::athletes::routes::routes(state.clone()))
        .nest("/uploads", features::uploads::routes::routes(state.clone()))
        .nest("/admin", features::admin::routes::routes(state.clone()));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::Session;
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use http_body_util::BodyExt;
    use storage::Database;
    use tower::ServiceExt;

    fn config(writes_enabled: bool) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "postgres://entrydesk@localhost:1/entrydesk".to_string(),
            admin_emails: "admin@example.com".to_string(),
            enforce_coach_allowlist: true,
            coach_emails: String::new(),
            coach_domains: "dojo.org".to_string(),
            writes_enabled,
            session_ttl_minutes: 60,
        }
    }

    fn state(writes_enabled: bool) -> AppState {
        let config = config(writes_enabled);
        let db = Database::connect_lazy(&config.database_url).unwrap();
        AppState::new(db, &config)
    }

    async fn signed_in(state: &AppState, is_admin: bool) -> String {
        state
            .sessions
            .create(Session {
                coach_id: 1,
                email: "sensei@dojo.org".to_string(),
                name: "Sensei".to_string(),
                is_admin,
                pending: None,
            })
            .await
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_athletes_require_session() {
        let app = router(state(true));

        let response = app
            .oneshot(Request::get("/api/athletes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let app = router(state(true));

        let response = app
            .oneshot(
                Request::get("/api/me")
                    .header(header::AUTHORIZATION, "Bearer not-a-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_writes_disabled_blocks_mutations() {
        let state = state(false);
        let token = signed_in(&state, false).await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::post("/api/athletes")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Registrations are closed");
    }

    #[tokio::test]
    async fn test_writes_disabled_blocks_uploads() {
        let state = state(false);
        let token = signed_in(&state, false).await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::post("/api/uploads/commit")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_commit_without_preview() {
        let state = state(true);
        let token = signed_in(&state, false).await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::post("/api/uploads/commit")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No upload waiting for confirmation");
    }

    #[tokio::test]
    async fn test_admin_routes_need_admin() {
        let state = state(true);
        let token = signed_in(&state, false).await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/api/admin/coaches")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_outside_allowlist() {
        let app = router(state(true));

        let response = app
            .oneshot(
                Request::post("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"someone@gmail.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_rejects_invalid_email() {
        let app = router(state(true));

        let response = app
            .oneshot(
                Request::post("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"not-an-email"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let state = state(true);
        let token = signed_in(&state, false).await;
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::post("/api/logout")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.sessions.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_template_download() {
        let app = router(state(false));

        let response = app
            .oneshot(
                Request::get("/api/uploads/template")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("entrysheet-template.xlsx"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"PK"));
    }
}
