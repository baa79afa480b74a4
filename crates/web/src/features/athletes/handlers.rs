use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use storage::dto::athlete::{
    AthleteResponse, AthleteStats, CreateAthleteRequest, DeleteAthletesRequest,
    UpdateAthleteRequest,
};

use crate::error::WebError;
use crate::middleware::auth::CurrentSession;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/athletes",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Athletes registered by the signed-in coach", body = Vec<AthleteResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "athletes"
)]
pub async fn list_athletes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    let athletes = services::list_athletes(state.db.pool(), current.coach_id()).await?;

    let response: Vec<AthleteResponse> = athletes.into_iter().map(AthleteResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/athletes",
    request_body = CreateAthleteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Athlete registered", body = AthleteResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed"),
        (status = 409, description = "Athlete already registered")
    ),
    tag = "athletes"
)]
pub async fn create_athlete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(mut req): Json<CreateAthleteRequest>,
) -> Result<Response, WebError> {
    services::canonicalize_create(&state.import_config, &mut req);
    services::validate_create(&state.import_config, &req)?;

    let athlete = services::create_athlete(state.db.pool(), current.coach_id(), &req).await?;
    tracing::info!(
        "Coach {} registered athlete {} (ID: {})",
        current.coach_id(),
        athlete.name,
        athlete.unique_id
    );

    Ok((StatusCode::CREATED, Json(AthleteResponse::from(athlete))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/athletes/{id}",
    params(
        ("id" = i32, Path, description = "Athlete ID")
    ),
    request_body = UpdateAthleteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Athlete updated", body = AthleteResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed"),
        (status = 404, description = "Athlete not found"),
        (status = 409, description = "Another athlete with the same name, date of birth and dojo exists")
    ),
    tag = "athletes"
)]
pub async fn update_athlete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i32>,
    Json(mut update_req): Json<UpdateAthleteRequest>,
) -> Result<Response, WebError> {
    services::canonicalize_update(&state.import_config, &mut update_req);
    services::validate_update(&state.import_config, &update_req)?;

    let existing =
        services::get_managed_athlete(state.db.pool(), id, |owner| current.can_manage(owner))
            .await?;
    let updated = services::update_athlete(state.db.pool(), &existing, &update_req).await?;

    Ok(Json(AthleteResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/athletes/{id}",
    params(
        ("id" = i32, Path, description = "Athlete ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Athlete deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed"),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn delete_athlete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i32>,
) -> Result<Response, WebError> {
    let athlete =
        services::get_managed_athlete(state.db.pool(), id, |owner| current.can_manage(owner))
            .await?;
    services::delete_athlete(state.db.pool(), athlete.id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/athletes/delete",
    request_body = DeleteAthletesRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Number of athletes deleted"),
        (status = 400, description = "No IDs given"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed")
    ),
    tag = "athletes"
)]
pub async fn delete_athletes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(req): Json<DeleteAthletesRequest>,
) -> Result<Response, WebError> {
    if req.ids.is_empty() {
        return Err(WebError::BadRequest("No athletes selected".to_string()));
    }

    let owner = (!current.is_admin()).then(|| current.coach_id());
    let deleted = services::delete_athletes(state.db.pool(), &req.ids, owner).await?;
    tracing::info!("Coach {} deleted {} athlete(s)", current.coach_id(), deleted);

    Ok(Json(json!({ "deleted": deleted })).into_response())
}

#[utoipa::path(
    get,
    path = "/api/stats",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Counts for the signed-in coach", body = AthleteStats),
        (status = 401, description = "Unauthorized")
    ),
    tag = "athletes"
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    let stats = services::stats(state.db.pool(), Some(current.coach_id())).await?;

    Ok(Json(stats).into_response())
}
