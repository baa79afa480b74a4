use chrono::NaiveDate;
use serde::Serialize;
use storage::models::{Athlete, NewAthlete};

use crate::duplicate::DuplicateKey;
use crate::normalize::{Day, Gender};

/// A fully validated row: every field present and in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AthleteRecord {
    pub name: String,
    pub dob: NaiveDate,
    pub dojo: String,
    pub belt: String,
    pub day: Day,
    pub gender: Gender,
    pub coach_id: i32,
}

impl AthleteRecord {
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::new(&self.name, self.dob, &self.dojo)
    }

    pub fn to_new_athlete(&self) -> NewAthlete {
        NewAthlete {
            name: self.name.clone(),
            dob: self.dob,
            dojo: self.dojo.clone(),
            belt: self.belt.clone(),
            day: self.day.as_str().to_string(),
            gender: self.gender.as_str().to_string(),
            coach_id: self.coach_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedRow {
    pub row_number: usize,
    pub record: AthleteRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row_number: usize,
    pub message: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.message)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Three-way partition of an uploaded batch. Every input row lands in exactly one list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub accepted: Vec<AcceptedRow>,
    pub skipped: Vec<RowIssue>,
    pub failed: Vec<RowIssue>,
}

impl ImportOutcome {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.skipped.len() + self.failed.len()
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            total: self.total(),
            accepted: self.accepted.len(),
            skipped: self.skipped.len(),
            failed: self.failed.len(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &AthleteRecord> {
        self.accepted.iter().map(|row| &row.record)
    }

    /// Skip and failure messages in spreadsheet order, e.g. "Row 4: Missing required field(s): Name".
    pub fn messages(&self) -> Vec<String> {
        issue_messages(&self.skipped, &self.failed)
    }
}

/// Result of an import that went all the way to the database.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub skipped: Vec<RowIssue>,
    pub failed: Vec<RowIssue>,
    pub created: Vec<Athlete>,
}

impl ImportReport {
    pub fn new(total: usize, created: Vec<Athlete>, skipped: Vec<RowIssue>, failed: Vec<RowIssue>) -> Self {
        Self {
            summary: ImportSummary {
                total,
                accepted: created.len(),
                skipped: skipped.len(),
                failed: failed.len(),
            },
            skipped,
            failed,
            created,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        issue_messages(&self.skipped, &self.failed)
    }
}

fn issue_messages(skipped: &[RowIssue], failed: &[RowIssue]) -> Vec<String> {
    let mut issues: Vec<&RowIssue> = skipped.iter().chain(failed).collect();
    issues.sort_by_key(|issue| issue.row_number);
    issues.into_iter().map(ToString::to_string).collect()
}
