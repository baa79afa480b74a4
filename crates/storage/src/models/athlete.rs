use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub const BELTS: &[&str] = &["White", "Yellow", "Blue", "Purple", "Green", "Brown", "Black"];
pub const DAYS: &[&str] = &["Saturday", "Sunday"];
pub const GENDERS: &[&str] = &["Male", "Female"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Athlete {
    pub id: i32,
    /// Tournament-wide athlete number, assigned by the database.
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

/// Canonical values for an insert; `unique_id` and timestamps come from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAthlete {
    pub name: String,
    pub dob: NaiveDate,
    pub dojo: String,
    pub belt: String,
    pub day: String,
    pub gender: String,
    pub coach_id: i32,
}
