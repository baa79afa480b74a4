use sqlx::PgPool;
use storage::{
    dto::coach::LoginRequest, error::Result, models::Coach, repository::coach::CoachRepository,
};

use crate::access::{AccessPolicy, normalize_email};

/// Display name for a coach who signed in without one: the local part of the email.
pub fn display_name(req: &LoginRequest, email: &str) -> String {
    req.name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}

/// Get or create the coach; listed admin emails are promoted on every sign-in.
pub async fn sign_in(pool: &PgPool, policy: &AccessPolicy, req: &LoginRequest) -> Result<Coach> {
    let email = normalize_email(&req.email);
    let name = display_name(req, &email);
    let repo = CoachRepository::new(pool);
    repo.upsert_on_login(&email, &name, req.google_id.as_deref(), policy.is_admin(&email))
        .await
}

pub async fn get_coach(pool: &PgPool, id: i32) -> Result<Coach> {
    let repo = CoachRepository::new(pool);
    repo.find_by_id(id).await
}
