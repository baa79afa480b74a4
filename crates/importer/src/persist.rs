use sqlx::{Acquire, PgPool};
use storage::error::StorageError;
use storage::models::Athlete;
use storage::repository::athlete::AthleteRepository;
use tracing::{info, warn};

use crate::batch::BatchImporter;
use crate::config::ImportConfig;
use crate::duplicate::{DuplicateKey, PersistedKeys};
use crate::models::{ImportOutcome, ImportReport, RowIssue};
use crate::row::RowInput;
use crate::Result;

/// Runs a batch against a coach's persisted athletes and stores what it accepts.
pub struct AthleteImporter<'a> {
    pool: &'a PgPool,
    config: &'a ImportConfig,
}

impl<'a> AthleteImporter<'a> {
    pub fn new(pool: &'a PgPool, config: &'a ImportConfig) -> Self {
        Self { pool, config }
    }

    pub async fn existing_keys(&self, coach_id: i32) -> Result<PersistedKeys> {
        let repo = AthleteRepository::new(self.pool);
        let keys = repo
            .keys_for_coach(coach_id)
            .await?
            .into_iter()
            .map(|(name, dob, dojo, unique_id)| (DuplicateKey::new(&name, dob, &dojo), unique_id))
            .collect();
        Ok(keys)
    }

    /// Validates without writing anything.
    pub async fn preview(&self, coach_id: i32, rows: Vec<RowInput>) -> Result<ImportOutcome> {
        let keys = self.existing_keys(coach_id).await?;
        Ok(BatchImporter::new(self.config, coach_id).run(rows, &keys))
    }

    /// Validates and inserts the accepted rows in one transaction.
    ///
    /// Each insert runs in its own savepoint: if a concurrent upload stored the same
    /// athlete after the keys were loaded, the unique index rejects the row and it is
    /// reported as skipped while the rest of the batch is kept.
    pub async fn import(&self, coach_id: i32, rows: Vec<RowInput>) -> Result<ImportReport> {
        let outcome = self.preview(coach_id, rows).await?;
        let total = outcome.total();
        let ImportOutcome {
            accepted,
            skipped,
            failed,
        } = outcome;

        let mut tx = self.pool.begin().await?;
        let mut inserts = Vec::with_capacity(accepted.len());

        for row in accepted {
            let mut savepoint = (&mut tx).begin().await?;
            let result = AthleteRepository::insert(&mut savepoint, &row.record.to_new_athlete()).await;
            let insert = classify_insert(row.row_number, result)?;
            match insert {
                InsertOutcome::Created(_) => savepoint.commit().await?,
                InsertOutcome::StoredConcurrently { row_number } => {
                    savepoint.rollback().await?;
                    warn!(
                        "Row {}: '{}' was stored concurrently, skipping",
                        row_number, row.record.name
                    );
                }
            }
            inserts.push(insert);
        }

        tx.commit().await?;
        let report = finish_report(total, inserts, skipped, failed);

        info!(
            "Imported {} athlete(s) for coach {} ({} skipped, {} failed)",
            report.summary.accepted, coach_id, report.summary.skipped, report.summary.failed
        );

        Ok(report)
    }
}

/// What happened to one accepted row at insert time.
#[derive(Debug)]
enum InsertOutcome {
    Created(Athlete),
    /// The unique index fired: another upload stored the athlete after the keys were loaded.
    StoredConcurrently { row_number: usize },
}

fn classify_insert(
    row_number: usize,
    result: std::result::Result<Athlete, StorageError>,
) -> std::result::Result<InsertOutcome, StorageError> {
    match result {
        Ok(athlete) => Ok(InsertOutcome::Created(athlete)),
        Err(e) if e.is_unique_violation() => Ok(InsertOutcome::StoredConcurrently { row_number }),
        Err(e) => Err(e),
    }
}

/// Folds insert results into the report. Rows lost to a concurrent upload join the
/// skipped list, which stays in spreadsheet order.
fn finish_report(
    total: usize,
    inserts: Vec<InsertOutcome>,
    mut skipped: Vec<RowIssue>,
    failed: Vec<RowIssue>,
) -> ImportReport {
    let mut created = Vec::with_capacity(inserts.len());
    for insert in inserts {
        match insert {
            InsertOutcome::Created(athlete) => created.push(athlete),
            InsertOutcome::StoredConcurrently { row_number } => skipped.push(RowIssue {
                row_number,
                message: "Duplicate of existing entry".to_string(),
            }),
        }
    }
    skipped.sort_by_key(|issue| issue.row_number);

    ImportReport::new(total, created, skipped, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[derive(Debug)]
    struct PgError {
        code: &'static str,
    }

    impl std::fmt::Display for PgError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "postgres error {}", self.code)
        }
    }

    impl std::error::Error for PgError {}

    impl DatabaseError for PgError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                "23505" => ErrorKind::UniqueViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(code: &'static str) -> StorageError {
        StorageError::Database(sqlx::Error::Database(Box::new(PgError { code })))
    }

    fn athlete(id: i32, name: &str) -> Athlete {
        let created_at = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Athlete {
            id,
            unique_id: 100 + id,
            name: name.to_string(),
            dob: NaiveDate::from_ymd_opt(2010, 5, 15).unwrap(),
            dojo: "Dragon Dojo".to_string(),
            belt: "Yellow".to_string(),
            day: "Saturday".to_string(),
            gender: "Male".to_string(),
            coach_id: 1,
            created_at,
            updated_at: created_at,
        }
    }

    fn issue(row_number: usize, message: &str) -> RowIssue {
        RowIssue {
            row_number,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_unique_violation_becomes_skip() {
        let insert = classify_insert(4, Err(db_error("23505"))).unwrap();
        assert!(matches!(insert, InsertOutcome::StoredConcurrently { row_number: 4 }));
    }

    #[test]
    fn test_other_database_errors_abort() {
        let err = classify_insert(4, Err(db_error("23503"))).unwrap_err();
        assert!(!err.is_unique_violation());
        assert!(classify_insert(4, Err(StorageError::NotFound)).is_err());
    }

    #[test]
    fn test_created_rows_pass_through() {
        let insert = classify_insert(2, Ok(athlete(1, "John Doe"))).unwrap();
        assert!(matches!(insert, InsertOutcome::Created(ref a) if a.name == "John Doe"));
    }

    #[test]
    fn test_concurrent_duplicates_merge_into_skipped_in_row_order() {
        let inserts = vec![
            InsertOutcome::Created(athlete(1, "John Doe")),
            InsertOutcome::StoredConcurrently { row_number: 3 },
            InsertOutcome::Created(athlete(2, "Mia Lee")),
            InsertOutcome::StoredConcurrently { row_number: 7 },
        ];
        let skipped = vec![
            issue(5, "Duplicate of earlier entry in row 2"),
            issue(8, "Missing required field(s): Name"),
        ];
        let failed = vec![issue(6, "Unreadable cell in column 'DOB': #DIV/0!")];

        let report = finish_report(7, inserts, skipped, failed);

        assert_eq!(report.summary.total, 7);
        assert_eq!(report.summary.accepted, 2);
        assert_eq!(report.summary.skipped, 4);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(
            report.summary.accepted + report.summary.skipped + report.summary.failed,
            report.summary.total
        );
        assert_eq!(
            report.skipped.iter().map(|i| i.row_number).collect::<Vec<_>>(),
            [3, 5, 7, 8]
        );
        assert_eq!(report.skipped[0].message, "Duplicate of existing entry");
        assert_eq!(
            report.created.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            ["John Doe", "Mia Lee"]
        );
        assert_eq!(report.messages()[0], "Row 3: Duplicate of existing entry");
        assert_eq!(report.messages()[3], "Row 7: Duplicate of existing entry");
    }
}
