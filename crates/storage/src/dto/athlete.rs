use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dto::common::PaginationParams;
use crate::models::athlete::{DAYS, GENDERS};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AthleteResponse {
    pub id: i32,
    pub unique_id: i32,
    pub name: String,
    pub dob: NaiveDate,
    pub dojo: String,
    pub belt: String,
    pub day: String,
    pub gender: String,
    pub coach_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Request payload for entering a single athlete by hand.
///
/// Day and gender must already be canonical ("Sunday", "Female"); the web layer
/// normalizes free-text tokens before validating. Belts depend on the tournament's
/// belt list, so only their length is checked here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAthleteRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_dob"))]
    pub dob: NaiveDate,

    #[validate(length(min = 1, max = 255, message = "Dojo must be between 1 and 255 characters"))]
    pub dojo: String,

    #[validate(length(min = 1, max = 50, message = "Belt is required"))]
    pub belt: String,

    #[validate(custom(function = "validate_day"))]
    pub day: String,

    #[validate(custom(function = "validate_gender"))]
    pub gender: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAthleteRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_dob"))]
    pub dob: Option<NaiveDate>,

    #[validate(length(min = 1, max = 255))]
    pub dojo: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub belt: Option<String>,

    #[validate(custom(function = "validate_day"))]
    pub day: Option<String>,

    #[validate(custom(function = "validate_gender"))]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteAthletesRequest {
    pub ids: Vec<i32>,
}

/// Query for the admin overview. All filters are optional and combined with AND.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AthleteFilter {
    /// Case-insensitive substring of name, dojo or belt
    pub search: Option<String>,
    pub day: Option<String>,
    pub belt: Option<String>,
    pub gender: Option<String>,
    pub coach_id: Option<i32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl AthleteFilter {
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }

    /// Search term with surrounding whitespace removed; `None` when blank.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AthleteStats {
    pub total: i64,
    pub saturday: i64,
    pub sunday: i64,
    pub male: i64,
    pub female: i64,
    pub by_belt: BTreeMap<String, i64>,
}

impl AthleteStats {
    /// Folds `(day, belt, gender, count)` groups into totals.
    pub fn from_groups(groups: impl IntoIterator<Item = (String, String, String, i64)>) -> Self {
        let mut stats = Self::default();
        for (day, belt, gender, count) in groups {
            stats.total += count;
            match day.as_str() {
                "Saturday" => stats.saturday += count,
                "Sunday" => stats.sunday += count,
                _ => {}
            }
            match gender.as_str() {
                "Male" => stats.male += count,
                "Female" => stats.female += count,
                _ => {}
            }
            *stats.by_belt.entry(belt).or_default() += count;
        }
        stats
    }
}

fn validate_one_of(
    value: &str,
    allowed: &[&str],
    code: &'static str,
) -> Result<(), validator::ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new(code);
        error.message = Some(format!("must be one of: {}", allowed.join(", ")).into());
        Err(error)
    }
}

fn validate_day(day: &str) -> Result<(), validator::ValidationError> {
    validate_one_of(day, DAYS, "invalid_day")
}

fn validate_gender(gender: &str) -> Result<(), validator::ValidationError> {
    validate_one_of(gender, GENDERS, "invalid_gender")
}

fn validate_dob(dob: &NaiveDate) -> Result<(), validator::ValidationError> {
    if *dob < Local::now().date_naive() {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("dob_not_in_past");
        error.message = Some("Date of birth must be in the past".into());
        Err(error)
    }
}

impl From<crate::models::Athlete> for AthleteResponse {
    fn from(athlete: crate::models::Athlete) -> Self {
        Self {
            id: athlete.id,
            unique_id: athlete.unique_id,
            name: athlete.name,
            dob: athlete.dob,
            dojo: athlete.dojo,
            belt: athlete.belt,
            day: athlete.day,
            gender: athlete.gender,
            coach_id: athlete.coach_id,
            created_at: athlete.created_at,
            updated_at: athlete.updated_at,
        }
    }
}
