use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::ImportConfig;
use crate::duplicate::{DuplicateKey, DuplicateLookup};
use crate::models::AthleteRecord;
use crate::normalize::collapse_whitespace;
use crate::row::{Column, RawRow};

/// Why a readable row was not accepted. The row number is attached by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("Missing required field(s): {}", .0.iter().map(Column::header).collect::<Vec<_>>().join(", "))]
    MissingFields(Vec<Column>),

    #[error("Invalid date format '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Date of birth {0} must be in the past")]
    DateNotInPast(NaiveDate),

    #[error("Invalid belt '{raw}' (expected one of: {accepted})")]
    InvalidBelt { raw: String, accepted: String },

    #[error("Invalid day '{raw}' (expected: {accepted})")]
    InvalidDay { raw: String, accepted: String },

    #[error("Invalid gender '{raw}' (expected: {accepted})")]
    InvalidGender { raw: String, accepted: String },

    #[error("Duplicate of earlier entry in row {first_row}")]
    DuplicateInBatch { first_row: usize },

    #[error("Duplicate of existing entry (ID: {unique_id})")]
    DuplicateExisting { unique_id: i32 },
}

impl SkipReason {
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateInBatch { .. } | Self::DuplicateExisting { .. }
        )
    }
}

pub struct RowValidator<'a> {
    config: &'a ImportConfig,
    today: NaiveDate,
}

impl<'a> RowValidator<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self {
            config,
            today: Local::now().date_naive(),
        }
    }

    /// Pins "today" for the date-of-birth check.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Field checks in order: presence, date, belt, day, gender. First failure wins.
    pub fn validate(&self, row: &RawRow, coach_id: i32) -> Result<AthleteRecord, SkipReason> {
        let missing: Vec<Column> = Column::all()
            .iter()
            .copied()
            .filter(|column| row.text(*column).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SkipReason::MissingFields(missing));
        }

        let text = |column: Column| row.text(column).unwrap_or_default();

        let dob = row
            .date(Column::Dob)
            .ok_or_else(|| SkipReason::InvalidDate(text(Column::Dob)))?;
        if dob >= self.today {
            return Err(SkipReason::DateNotInPast(dob));
        }

        let raw_belt = text(Column::Belt);
        let belt = self
            .config
            .belt(&raw_belt)
            .ok_or_else(|| SkipReason::InvalidBelt {
                accepted: self.config.accepted_belts(),
                raw: raw_belt.clone(),
            })?
            .to_string();

        let raw_day = text(Column::Day);
        let day = self
            .config
            .day_tokens
            .lookup(&raw_day)
            .ok_or_else(|| SkipReason::InvalidDay {
                accepted: self.config.day_tokens.accepted_tokens(),
                raw: raw_day.clone(),
            })?;

        let raw_gender = text(Column::Gender);
        let gender = self
            .config
            .gender_tokens
            .lookup(&raw_gender)
            .ok_or_else(|| SkipReason::InvalidGender {
                accepted: self.config.gender_tokens.accepted_tokens(),
                raw: raw_gender.clone(),
            })?;

        Ok(AthleteRecord {
            name: collapse_whitespace(&text(Column::Name)),
            dob,
            dojo: collapse_whitespace(&text(Column::Dojo)),
            belt,
            day,
            gender,
            coach_id,
        })
    }

    /// Final check: the record must not repeat an earlier accepted row of the batch
    /// (`earlier` maps keys to their row numbers) nor a persisted athlete.
    pub fn check_duplicate<L>(
        &self,
        record: &AthleteRecord,
        earlier: &HashMap<DuplicateKey, usize>,
        lookup: &L,
    ) -> Result<DuplicateKey, SkipReason>
    where
        L: DuplicateLookup + ?Sized,
    {
        let key = record.duplicate_key();
        if let Some(first_row) = earlier.get(&key) {
            return Err(SkipReason::DuplicateInBatch {
                first_row: *first_row,
            });
        }
        if let Some(unique_id) = lookup.find(&key) {
            return Err(SkipReason::DuplicateExisting { unique_id });
        }
        Ok(key)
    }
}
