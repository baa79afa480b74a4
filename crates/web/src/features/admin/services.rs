use sqlx::PgPool;
use storage::{
    dto::athlete::{AthleteFilter, AthleteStats},
    error::Result,
    models::{Athlete, Coach},
    repository::{athlete::AthleteRepository, coach::CoachRepository},
};

pub async fn list_athletes(pool: &PgPool, filter: &AthleteFilter) -> Result<(Vec<Athlete>, i64)> {
    let repo = AthleteRepository::new(pool);
    repo.list_filtered(filter).await
}

pub async fn list_coaches(pool: &PgPool) -> Result<Vec<Coach>> {
    let repo = CoachRepository::new(pool);
    repo.list().await
}

pub async fn stats(pool: &PgPool, coach_id: Option<i32>) -> Result<AthleteStats> {
    let repo = AthleteRepository::new(pool);
    repo.stats(coach_id).await
}
