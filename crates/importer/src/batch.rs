use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::duplicate::DuplicateLookup;
use crate::models::{AcceptedRow, ImportOutcome, RowIssue};
use crate::row::RowInput;
use crate::validator::RowValidator;

/// Runs the row validator over a whole upload, in spreadsheet order.
///
/// A bad row never stops the batch. The only state carried from one row to the
/// next is the set of keys already accepted, so a row can only ever be a duplicate
/// of a row *above* it.
pub struct BatchImporter<'a> {
    validator: RowValidator<'a>,
    coach_id: i32,
}

impl<'a> BatchImporter<'a> {
    pub fn new(config: &'a ImportConfig, coach_id: i32) -> Self {
        Self {
            validator: RowValidator::new(config),
            coach_id,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.validator = self.validator.with_today(today);
        self
    }

    pub fn run<I, L>(&self, rows: I, lookup: &L) -> ImportOutcome
    where
        I: IntoIterator,
        I::Item: Into<RowInput>,
        L: DuplicateLookup + ?Sized,
    {
        let mut outcome = ImportOutcome::default();
        let mut seen = HashMap::new();

        for input in rows {
            match input.into() {
                RowInput::Unreadable { row_number, error } => {
                    debug!("Row {} unreadable: {}", row_number, error);
                    outcome.failed.push(RowIssue {
                        row_number,
                        message: error,
                    });
                }
                RowInput::Row(row) => {
                    let result = self
                        .validator
                        .validate(&row, self.coach_id)
                        .and_then(|record| {
                            self.validator
                                .check_duplicate(&record, &seen, lookup)
                                .map(|key| (key, record))
                        });

                    match result {
                        Ok((key, record)) => {
                            seen.insert(key, row.row_number);
                            outcome.accepted.push(AcceptedRow {
                                row_number: row.row_number,
                                record,
                            });
                        }
                        Err(reason) => {
                            debug!("Row {} skipped: {}", row.row_number, reason);
                            outcome.skipped.push(RowIssue {
                                row_number: row.row_number,
                                message: reason.to_string(),
                            });
                        }
                    }
                }
            }
        }

        let summary = outcome.summary();
        info!(
            "Validated {} row(s) for coach {}: {} accepted, {} skipped, {} failed",
            summary.total, self.coach_id, summary.accepted, summary.skipped, summary.failed
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicate::{DuplicateKey, NoPersisted, PersistedKeys};
    use crate::normalize::{Day, Gender};
    use crate::row::{Column, RawRow};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn rows(data: &[[&str; 6]]) -> Vec<RawRow> {
        data.iter()
            .enumerate()
            .map(|(idx, values)| {
                Column::all()
                    .iter()
                    .zip(values)
                    .fold(RawRow::new(idx + 2), |row, (column, value)| {
                        row.with(column.header(), *value)
                    })
            })
            .collect()
    }

    fn run<L: DuplicateLookup>(data: &[[&str; 6]], lookup: &L) -> ImportOutcome {
        let config = ImportConfig::default();
        BatchImporter::new(&config, 5)
            .with_today(today())
            .run(rows(data), lookup)
    }

    #[test]
    fn test_mixed_batch_scenario() {
        let outcome = run(
            &[
                ["John Doe", "2010-05-15", "Dragon Dojo", "Yellow", "Saturday", "Male"],
                ["Jane Smith", "2011-08-22", "Phoenix", "Green", "sun", "f"],
                ["", "2012-01-01", "X", "Yellow", "Sunday", "Male"],
            ],
            &NoPersisted,
        );

        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.accepted[0].record.name, "John Doe");
        assert_eq!(outcome.accepted[0].row_number, 2);
        let jane = &outcome.accepted[1].record;
        assert_eq!(jane.name, "Jane Smith");
        assert_eq!(jane.day, Day::Sunday);
        assert_eq!(jane.gender, Gender::Female);
        assert_eq!(jane.coach_id, 5);

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].row_number, 4);
        assert!(outcome.skipped[0].message.contains("Name"));
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_partition_is_complete() {
        let config = ImportConfig::default();
        let mut inputs: Vec<RowInput> = rows(&[
            ["A", "2010-01-01", "D", "White", "Sat", "M"],
            ["B", "bad", "D", "White", "Sat", "M"],
            ["A", "2010-01-01", "D", "Black", "Sun", "F"],
        ])
        .into_iter()
        .map(RowInput::from)
        .collect();
        inputs.push(RowInput::Unreadable {
            row_number: 5,
            error: "Unreadable cell in column 'DOB': #REF!".to_string(),
        });

        let total = inputs.len();
        let outcome = BatchImporter::new(&config, 1)
            .with_today(today())
            .run(inputs, &NoPersisted);

        let summary = outcome.summary();
        assert_eq!(summary.total, total);
        assert_eq!(summary.accepted + summary.skipped + summary.failed, total);
        assert_eq!((summary.accepted, summary.skipped, summary.failed), (1, 2, 1));
        assert_eq!(outcome.failed[0].row_number, 5);
    }

    #[test]
    fn test_later_duplicate_is_skipped_earlier_kept() {
        let outcome = run(
            &[
                ["John Doe", "2010-05-15", "Dragon Dojo", "Yellow", "Sat", "Male"],
                ["Mia Lee", "2012-03-03", "Phoenix", "Blue", "Sun", "Girl"],
                ["john  doe", "2010-05-15", "dragon dojo", "Black", "Sun", "Female"],
            ],
            &NoPersisted,
        );

        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.accepted[0].record.name, "John Doe");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].row_number, 4);
        assert_eq!(outcome.skipped[0].message, "Duplicate of earlier entry in row 2");
    }

    #[test]
    fn test_skipped_rows_do_not_count_as_earlier_entries() {
        // Row 2 is rejected for its belt, so row 3 is the first valid occurrence.
        let outcome = run(
            &[
                ["John Doe", "2010-05-15", "Dragon Dojo", "Orange", "Sat", "Male"],
                ["John Doe", "2010-05-15", "Dragon Dojo", "Yellow", "Sat", "Male"],
            ],
            &NoPersisted,
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].row_number, 3);
    }

    #[test]
    fn test_persisted_duplicate_skips_first_occurrence() {
        let dob = NaiveDate::from_ymd_opt(2011, 8, 22).unwrap();
        let persisted: PersistedKeys = [(DuplicateKey::new("Jane Smith", dob, "Phoenix"), 42)]
            .into_iter()
            .collect();

        let outcome = run(
            &[["Jane Smith", "2011-08-22", "Phoenix", "Green", "Sunday", "Female"]],
            &persisted,
        );

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.skipped[0].message, "Duplicate of existing entry (ID: 42)");
    }

    #[test]
    fn test_accepted_preserves_input_order() {
        let outcome = run(
            &[
                ["Zed", "2010-01-01", "D", "White", "Sat", "M"],
                ["Amy", "2010-01-02", "D", "White", "Sat", "F"],
                ["Kim", "2010-01-03", "D", "White", "Sun", "F"],
            ],
            &NoPersisted,
        );
        let names: Vec<&str> = outcome.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Zed", "Amy", "Kim"]);
    }

    #[test]
    fn test_messages_are_in_row_order() {
        let config = ImportConfig::default();
        let mut inputs: Vec<RowInput> = vec![RowInput::Unreadable {
            row_number: 2,
            error: "broken".to_string(),
        }];
        inputs.extend(
            rows(&[
                ["A", "2010-01-01", "D", "White", "Sat", "M"],
                ["B", "2010-01-01", "D", "Pink", "Sat", "M"],
            ])
            .into_iter()
            .map(|mut row| {
                row.row_number += 1;
                RowInput::Row(row)
            }),
        );

        let outcome = BatchImporter::new(&config, 1)
            .with_today(today())
            .run(inputs, &NoPersisted);
        let messages = outcome.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "Row 2: broken");
        assert!(messages[1].starts_with("Row 4: Invalid belt 'Pink'"));
    }
}
