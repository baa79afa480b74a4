use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::dto::athlete::{AthleteFilter, AthleteStats, UpdateAthleteRequest};
use crate::error::{Result, StorageError};
use crate::models::{Athlete, NewAthlete};

const ATHLETE_COLUMNS: &str = "id, unique_id, name, dob, dojo, belt, day, gender, coach_id, created_at, updated_at";

/// SQL expression matching the duplicate-key normalization: trimmed, single-spaced, lower-case.
fn normalized(column: &str) -> String {
    format!("lower(regexp_replace(btrim({column}), '\\s+', ' ', 'g'))")
}

pub struct AthleteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AthleteRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a coach's athletes in registration order
    pub async fn list_by_coach(&self, coach_id: i32) -> Result<Vec<Athlete>> {
        let athletes = sqlx::query_as::<_, Athlete>(&format!(
            "SELECT {ATHLETE_COLUMNS} FROM athletes WHERE coach_id = $1 ORDER BY unique_id"
        ))
        .bind(coach_id)
        .fetch_all(self.pool)
        .await?;

        Ok(athletes)
    }

    /// Filtered, paginated listing across all coaches, with the unpaginated total
    pub async fn list_filtered(&self, filter: &AthleteFilter) -> Result<(Vec<Athlete>, i64)> {
        let pagination = filter.pagination();

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM athletes WHERE TRUE");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ATHLETE_COLUMNS} FROM athletes WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY unique_id LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let athletes = query
            .build_query_as::<Athlete>()
            .fetch_all(self.pool)
            .await?;

        Ok((athletes, total))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Athlete> {
        sqlx::query_as::<_, Athlete>(&format!(
            "SELECT {ATHLETE_COLUMNS} FROM athletes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// `(name, dob, dojo, unique_id)` of every athlete a coach registered
    pub async fn keys_for_coach(&self, coach_id: i32) -> Result<Vec<(String, NaiveDate, String, i32)>> {
        let keys = sqlx::query_as::<_, (String, NaiveDate, String, i32)>(
            "SELECT name, dob, dojo, unique_id FROM athletes WHERE coach_id = $1",
        )
        .bind(coach_id)
        .fetch_all(self.pool)
        .await?;

        Ok(keys)
    }

    /// Existing athlete of this coach with the same name, date of birth and dojo.
    ///
    /// `exclude_id` leaves out the athlete being edited.
    pub async fn find_duplicate(
        &self,
        coach_id: i32,
        name: &str,
        dob: NaiveDate,
        dojo: &str,
        exclude_id: Option<i32>,
    ) -> Result<Option<Athlete>> {
        let athlete = sqlx::query_as::<_, Athlete>(&format!(
            r#"
            SELECT {ATHLETE_COLUMNS} FROM athletes
            WHERE coach_id = $1
              AND {name_expr} = {name_param}
              AND dob = $3
              AND {dojo_expr} = {dojo_param}
              AND ($5::int IS NULL OR id <> $5)
            LIMIT 1
            "#,
            name_expr = normalized("name"),
            name_param = normalized("$2"),
            dojo_expr = normalized("dojo"),
            dojo_param = normalized("$4"),
        ))
        .bind(coach_id)
        .bind(name)
        .bind(dob)
        .bind(dojo)
        .bind(exclude_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(athlete)
    }

    /// Create a new athlete, rejecting duplicates of the same coach
    pub async fn create(&self, new: &NewAthlete) -> Result<Athlete> {
        if let Some(existing) = self
            .find_duplicate(new.coach_id, &new.name, new.dob, &new.dojo, None)
            .await?
        {
            return Err(StorageError::DuplicateAthlete {
                name: existing.name,
                unique_id: existing.unique_id,
            });
        }

        let mut tx = self.pool.begin().await?;
        let athlete = Self::insert(&mut tx, new).await?;
        tx.commit().await?;

        Ok(athlete)
    }

    /// Insert inside a caller-owned transaction (or savepoint)
    pub async fn insert(tx: &mut Transaction<'_, Postgres>, new: &NewAthlete) -> Result<Athlete> {
        let athlete = sqlx::query_as::<_, Athlete>(&format!(
            r#"
            INSERT INTO athletes (name, dob, dojo, belt, day, gender, coach_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ATHLETE_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.dob)
        .bind(&new.dojo)
        .bind(&new.belt)
        .bind(&new.day)
        .bind(&new.gender)
        .bind(new.coach_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(athlete)
    }

    /// Update an existing athlete, keeping fields the request leaves out
    pub async fn update(&self, existing: &Athlete, req: &UpdateAthleteRequest) -> Result<Athlete> {
        let name = req.name.as_ref().unwrap_or(&existing.name);
        let dob = req.dob.unwrap_or(existing.dob);
        let dojo = req.dojo.as_ref().unwrap_or(&existing.dojo);
        let belt = req.belt.as_ref().unwrap_or(&existing.belt);
        let day = req.day.as_ref().unwrap_or(&existing.day);
        let gender = req.gender.as_ref().unwrap_or(&existing.gender);

        if req.name.is_some() || req.dob.is_some() || req.dojo.is_some() {
            if let Some(other) = self
                .find_duplicate(existing.coach_id, name, dob, dojo, Some(existing.id))
                .await?
            {
                return Err(StorageError::DuplicateAthlete {
                    name: other.name,
                    unique_id: other.unique_id,
                });
            }
        }

        let athlete = sqlx::query_as::<_, Athlete>(&format!(
            r#"
            UPDATE athletes
            SET name = $2,
                dob = $3,
                dojo = $4,
                belt = $5,
                day = $6,
                gender = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ATHLETE_COLUMNS}
            "#
        ))
        .bind(existing.id)
        .bind(name)
        .bind(dob)
        .bind(dojo)
        .bind(belt)
        .bind(day)
        .bind(gender)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StorageError::from(e).or_constraint("Athlete already registered"))?
        .ok_or(StorageError::NotFound)?;

        Ok(athlete)
    }

    /// Delete an athlete by ID
    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM athletes WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    /// Delete several athletes; `coach_id` restricts deletion to that coach's athletes
    pub async fn delete_many(&self, ids: &[i32], coach_id: Option<i32>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM athletes WHERE id = ANY($1) AND ($2::int IS NULL OR coach_id = $2)",
        )
        .bind(ids)
        .bind(coach_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts per day, gender and belt; `None` aggregates every coach
    pub async fn stats(&self, coach_id: Option<i32>) -> Result<AthleteStats> {
        let groups = sqlx::query_as::<_, (String, String, String, i64)>(
            r#"
            SELECT day, belt, gender, COUNT(*)::bigint
            FROM athletes
            WHERE ($1::int IS NULL OR coach_id = $1)
            GROUP BY day, belt, gender
            "#,
        )
        .bind(coach_id)
        .fetch_all(self.pool)
        .await?;

        Ok(AthleteStats::from_groups(groups))
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AthleteFilter) {
    if let Some(term) = filter.search_term() {
        let pattern = format!("%{}%", term);
        query
            .push(" AND (lower(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(dojo) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(belt) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(day) = filter.day.as_deref().filter(|d| !d.eq_ignore_ascii_case("all")) {
        query.push(" AND day = ").push_bind(day.to_string());
    }
    if let Some(belt) = filter.belt.as_deref().filter(|b| !b.eq_ignore_ascii_case("all")) {
        query.push(" AND belt = ").push_bind(belt.to_string());
    }
    if let Some(gender) = filter.gender.as_deref().filter(|g| !g.eq_ignore_ascii_case("all")) {
        query.push(" AND gender = ").push_bind(gender.to_string());
    }
    if let Some(coach_id) = filter.coach_id {
        query.push(" AND coach_id = ").push_bind(coach_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_expression() {
        assert_eq!(
            normalized("name"),
            r"lower(regexp_replace(btrim(name), '\s+', ' ', 'g'))"
        );
    }

    #[test]
    fn test_filters_render_in_order() {
        let filter = AthleteFilter {
            search: Some("dragon".to_string()),
            day: Some("Saturday".to_string()),
            belt: Some("All".to_string()),
            coach_id: Some(4),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM athletes WHERE TRUE");
        push_filters(&mut query, &filter);
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM athletes WHERE TRUE AND (lower(name) LIKE $1 OR lower(dojo) LIKE $2 \
             OR lower(belt) LIKE $3) AND day = $4 AND coach_id = $5"
        );
    }
}
