use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::coach::{CoachResponse, LoginRequest, LoginResponse};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentSession;
use crate::session::Session;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Email is not on the coach allowlist")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    if !state.access.is_allowed(&req.email) {
        tracing::warn!("Sign-in refused for {}", req.email);
        return Err(WebError::Forbidden(
            "This email is not authorized to register athletes".to_string(),
        ));
    }

    let coach = services::sign_in(state.db.pool(), &state.access, &req).await?;
    let token = state.sessions.create(Session::for_coach(&coach)).await;
    tracing::info!("Coach {} signed in (admin: {})", coach.email, coach.is_admin);

    Ok(Json(LoginResponse {
        token,
        coach: CoachResponse::from(coach),
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/logout",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    state.sessions.remove(&current.token).await;
    tracing::info!("Coach {} signed out", current.session.email);

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/me",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The signed-in coach", body = CoachResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    let coach = services::get_coach(state.db.pool(), current.coach_id()).await?;

    Ok(Json(CoachResponse::from(coach)).into_response())
}
