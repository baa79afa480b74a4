use importer::ImportConfig;
use importer::normalize::collapse_whitespace;
use sqlx::PgPool;
use std::borrow::Cow;
use storage::{
    dto::athlete::{AthleteStats, CreateAthleteRequest, UpdateAthleteRequest},
    error::{Result, StorageError},
    models::{Athlete, NewAthlete},
    repository::athlete::AthleteRepository,
};
use validator::{Validate, ValidationError, ValidationErrors};

/// Maps free-text belt, day and gender ("sat", "f", "yellow") onto their canonical names.
///
/// Unrecognized values are left as typed so validation reports them.
pub fn canonicalize_create(config: &ImportConfig, req: &mut CreateAthleteRequest) {
    req.name = collapse_whitespace(&req.name);
    req.dojo = collapse_whitespace(&req.dojo);
    canonical_belt(config, &mut req.belt);
    canonical_day(config, &mut req.day);
    canonical_gender(config, &mut req.gender);
}

pub fn canonicalize_update(config: &ImportConfig, req: &mut UpdateAthleteRequest) {
    if let Some(name) = req.name.as_mut() {
        *name = collapse_whitespace(name);
    }
    if let Some(dojo) = req.dojo.as_mut() {
        *dojo = collapse_whitespace(dojo);
    }
    if let Some(belt) = req.belt.as_mut() {
        canonical_belt(config, belt);
    }
    if let Some(day) = req.day.as_mut() {
        canonical_day(config, day);
    }
    if let Some(gender) = req.gender.as_mut() {
        canonical_gender(config, gender);
    }
}

/// Field rules from the request plus the tournament's belt list.
pub fn validate_create(
    config: &ImportConfig,
    req: &CreateAthleteRequest,
) -> std::result::Result<(), ValidationErrors> {
    let mut errors = req.validate().err().unwrap_or_default();
    check_belt(config, &req.belt, &mut errors);
    into_result(errors)
}

pub fn validate_update(
    config: &ImportConfig,
    req: &UpdateAthleteRequest,
) -> std::result::Result<(), ValidationErrors> {
    let mut errors = req.validate().err().unwrap_or_default();
    if let Some(belt) = req.belt.as_deref() {
        check_belt(config, belt, &mut errors);
    }
    into_result(errors)
}

fn check_belt(config: &ImportConfig, belt: &str, errors: &mut ValidationErrors) {
    if belt.is_empty() || config.belts.iter().any(|b| b == belt) {
        return;
    }
    let mut error = ValidationError::new("invalid_belt");
    error.message = Some(Cow::Owned(format!(
        "must be one of: {}",
        config.accepted_belts()
    )));
    errors.add("belt", error);
}

fn into_result(errors: ValidationErrors) -> std::result::Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn canonical_belt(config: &ImportConfig, belt: &mut String) {
    if let Some(canonical) = config.belt(belt) {
        *belt = canonical.to_string();
    }
}

fn canonical_day(config: &ImportConfig, day: &mut String) {
    if let Some(canonical) = config.day_tokens.lookup(day) {
        *day = canonical.as_str().to_string();
    }
}

fn canonical_gender(config: &ImportConfig, gender: &mut String) {
    if let Some(canonical) = config.gender_tokens.lookup(gender) {
        *gender = canonical.as_str().to_string();
    }
}

pub async fn list_athletes(pool: &PgPool, coach_id: i32) -> Result<Vec<Athlete>> {
    let repo = AthleteRepository::new(pool);
    repo.list_by_coach(coach_id).await
}

pub async fn create_athlete(
    pool: &PgPool,
    coach_id: i32,
    req: &CreateAthleteRequest,
) -> Result<Athlete> {
    let repo = AthleteRepository::new(pool);
    let new = NewAthlete {
        name: req.name.clone(),
        dob: req.dob,
        dojo: req.dojo.clone(),
        belt: req.belt.clone(),
        day: req.day.clone(),
        gender: req.gender.clone(),
        coach_id,
    };
    repo.create(&new)
        .await
        .map_err(|e| e.or_constraint("Athlete already registered"))
}

/// Fetches an athlete the caller may manage; someone else's athlete reads as missing.
pub async fn get_managed_athlete(
    pool: &PgPool,
    id: i32,
    can_manage: impl Fn(i32) -> bool,
) -> Result<Athlete> {
    let repo = AthleteRepository::new(pool);
    let athlete = repo.find_by_id(id).await?;
    if !can_manage(athlete.coach_id) {
        return Err(StorageError::NotFound);
    }
    Ok(athlete)
}

pub async fn update_athlete(
    pool: &PgPool,
    existing: &Athlete,
    req: &UpdateAthleteRequest,
) -> Result<Athlete> {
    let repo = AthleteRepository::new(pool);
    repo.update(existing, req).await
}

pub async fn delete_athlete(pool: &PgPool, id: i32) -> Result<()> {
    let repo = AthleteRepository::new(pool);
    repo.delete(id).await
}

/// `coach_id` of `None` lets an admin delete across coaches.
pub async fn delete_athletes(pool: &PgPool, ids: &[i32], coach_id: Option<i32>) -> Result<u64> {
    let repo = AthleteRepository::new(pool);
    repo.delete_many(ids, coach_id).await
}

pub async fn stats(pool: &PgPool, coach_id: Option<i32>) -> Result<AthleteStats> {
    let repo = AthleteRepository::new(pool);
    repo.stats(coach_id).await
}
