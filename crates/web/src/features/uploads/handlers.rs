use axum::{
    Extension, Json,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use importer::template::{TEMPLATE_FILE_NAME, template_workbook};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::WebError;
use crate::middleware::auth::CurrentSession;
use crate::session::PendingUpload;
use crate::state::AppState;

use super::services;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Admins only: file the athletes under this coach
    pub coach_id: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/uploads",
    params(UploadQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Import report with created, skipped and failed rows"),
        (status = 400, description = "Unreadable file or missing columns"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed")
    ),
    tag = "uploads"
)]
pub async fn upload(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let coach_id = services::target_coach(state.db.pool(), &current, query.coach_id).await?;
    let sheet = services::read_upload(multipart).await?;
    tracing::info!("Importing {} for coach {}", sheet.file_name, coach_id);

    let report =
        services::import_rows(state.db.pool(), &state.import_config, coach_id, sheet.rows).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/uploads/preview",
    params(UploadQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Validation result; nothing is stored until the upload is committed"),
        (status = 400, description = "Unreadable file or missing columns"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed")
    ),
    tag = "uploads"
)]
pub async fn preview(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let coach_id = services::target_coach(state.db.pool(), &current, query.coach_id).await?;
    let sheet = services::read_upload(multipart).await?;

    let response = services::preview_rows(
        state.db.pool(),
        &state.import_config,
        coach_id,
        sheet.file_name.clone(),
        sheet.rows.clone(),
    )
    .await?;

    tracing::info!(
        "{} previewed {} for coach {}: {} row(s)",
        current.session.name,
        sheet.file_name,
        coach_id,
        response.summary.total
    );

    let pending = PendingUpload {
        coach_id,
        file_name: sheet.file_name,
        rows: sheet.rows,
    };
    if !state.sessions.set_pending(&current.token, pending).await {
        return Err(WebError::Unauthorized);
    }

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/uploads/commit",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Import report for the previewed upload"),
        (status = 400, description = "No upload waiting for confirmation"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registrations are closed")
    ),
    tag = "uploads"
)]
pub async fn commit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    let pending = state
        .sessions
        .take_pending(&current.token)
        .await
        .ok_or_else(|| WebError::BadRequest("No upload waiting for confirmation".to_string()))?;
    tracing::info!(
        "Committing {} for coach {}",
        pending.file_name,
        pending.coach_id
    );

    // Rows are validated again; other uploads may have landed since the preview.
    let report = services::import_rows(
        state.db.pool(),
        &state.import_config,
        pending.coach_id,
        pending.rows,
    )
    .await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/uploads/pending",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Previewed upload discarded"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "uploads"
)]
pub async fn discard(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, WebError> {
    state.sessions.clear_pending(&current.token).await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/uploads/template",
    responses(
        (status = 200, description = "Entry sheet template (xlsx)", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    ),
    tag = "uploads"
)]
pub async fn download_template() -> Result<Response, WebError> {
    let bytes = template_workbook()?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", TEMPLATE_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
