use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Coach {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub google_id: Option<String>,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}
