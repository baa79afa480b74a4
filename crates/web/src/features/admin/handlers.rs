use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use storage::dto::{
    athlete::{AthleteFilter, AthleteResponse, AthleteStats},
    coach::CoachResponse,
    common::PaginatedResponse,
};
use utoipa::IntoParams;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Restrict the counts to one coach
    pub coach_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/admin/athletes",
    params(AthleteFilter),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Filtered athletes of every coach, paginated"),
        (status = 400, description = "Invalid pagination parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn list_athletes(
    State(state): State<AppState>,
    Query(filter): Query<AthleteFilter>,
) -> Result<Response, WebError> {
    let pagination = filter.pagination();
    pagination.validate().map_err(WebError::BadRequest)?;

    let (athletes, total) = services::list_athletes(state.db.pool(), &filter).await?;
    let data: Vec<AthleteResponse> = athletes.into_iter().map(AthleteResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, pagination, total)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/admin/coaches",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All coaches", body = Vec<CoachResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn list_coaches(State(state): State<AppState>) -> Result<Response, WebError> {
    let coaches = services::list_coaches(state.db.pool()).await?;

    let response: Vec<CoachResponse> = coaches.into_iter().map(CoachResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    params(StatsQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Counts across all coaches", body = AthleteStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Response, WebError> {
    let stats = services::stats(state.db.pool(), query.coach_id).await?;

    Ok(Json(stats).into_response())
}
