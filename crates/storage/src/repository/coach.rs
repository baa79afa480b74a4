use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::Coach;

const COACH_COLUMNS: &str = "id, email, name, google_id, is_admin, created_at";

pub struct CoachRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CoachRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all coaches by name
    pub async fn list(&self) -> Result<Vec<Coach>> {
        let coaches = sqlx::query_as::<_, Coach>(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches ORDER BY name, email"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(coaches)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Coach> {
        sqlx::query_as::<_, Coach>(&format!("SELECT {COACH_COLUMNS} FROM coaches WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Emails are stored lower-cased; callers pass the normalized form
    pub async fn find_by_email(&self, email: &str) -> Result<Coach> {
        sqlx::query_as::<_, Coach>(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Get or create the coach signing in.
    ///
    /// `promote_admin` turns an existing account into an admin. The flag is only
    /// ever OR-ed in, so removing an email from the admin list never demotes anyone.
    pub async fn upsert_on_login(
        &self,
        email: &str,
        name: &str,
        google_id: Option<&str>,
        promote_admin: bool,
    ) -> Result<Coach> {
        let coach = sqlx::query_as::<_, Coach>(&format!(
            r#"
            INSERT INTO coaches (email, name, google_id, is_admin)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email)
            DO UPDATE SET
                is_admin = coaches.is_admin OR EXCLUDED.is_admin,
                google_id = COALESCE(coaches.google_id, EXCLUDED.google_id)
            RETURNING {COACH_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(name)
        .bind(google_id)
        .bind(promote_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from(e).or_constraint("Account is linked to another sign-in"))?;

        Ok(coach)
    }
}
