use std::path::Path;

use axum::extract::Multipart;
use importer::{
    AcceptedRow, AthleteImporter, ImportConfig, ImportReport, ImportSummary, RowInput, RowIssue,
    SheetFormat, read_rows,
};
use serde::Serialize;
use sqlx::PgPool;
use storage::repository::coach::CoachRepository;

use crate::error::WebError;
use crate::middleware::auth::CurrentSession;

/// Largest spreadsheet accepted by the upload endpoints.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct UploadedSheet {
    pub file_name: String,
    pub rows: Vec<RowInput>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub file_name: String,
    pub coach_id: i32,
    pub summary: ImportSummary,
    pub accepted: Vec<AcceptedRow>,
    pub skipped: Vec<RowIssue>,
    pub failed: Vec<RowIssue>,
    pub messages: Vec<String>,
}

/// Reads the `file` field of a multipart body and parses it into rows.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedSheet, WebError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let format = SheetFormat::from_path(Path::new(&file_name))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(e.to_string()))?;

        if bytes.is_empty() {
            return Err(WebError::BadRequest("Uploaded file is empty".to_string()));
        }

        tracing::debug!("Received {} ({} bytes)", file_name, bytes.len());
        let rows = read_rows(&bytes, format)?;
        return Ok(UploadedSheet { file_name, rows });
    }

    Err(WebError::BadRequest(
        "No file received in multipart upload".to_string(),
    ))
}

/// Coach the upload is filed under: the caller, or for admins any existing coach.
pub async fn target_coach(
    pool: &PgPool,
    current: &CurrentSession,
    requested: Option<i32>,
) -> Result<i32, WebError> {
    match requested {
        None => Ok(current.coach_id()),
        Some(id) if id == current.coach_id() => Ok(id),
        Some(id) if current.is_admin() => {
            let coach = CoachRepository::new(pool).find_by_id(id).await?;
            Ok(coach.id)
        }
        Some(_) => Err(WebError::Forbidden(
            "Only admins can upload on behalf of another coach".to_string(),
        )),
    }
}

pub async fn import_rows(
    pool: &PgPool,
    config: &ImportConfig,
    coach_id: i32,
    rows: Vec<RowInput>,
) -> Result<ImportReport, WebError> {
    let report = AthleteImporter::new(pool, config)
        .import(coach_id, rows)
        .await?;
    Ok(report)
}

pub async fn preview_rows(
    pool: &PgPool,
    config: &ImportConfig,
    coach_id: i32,
    file_name: String,
    rows: Vec<RowInput>,
) -> Result<PreviewResponse, WebError> {
    let outcome = AthleteImporter::new(pool, config)
        .preview(coach_id, rows)
        .await?;

    Ok(PreviewResponse {
        file_name,
        coach_id,
        summary: outcome.summary(),
        messages: outcome.messages(),
        accepted: outcome.accepted,
        skipped: outcome.skipped,
        failed: outcome.failed,
    })
}
