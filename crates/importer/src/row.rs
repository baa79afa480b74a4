use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

/// The six required spreadsheet columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Dob,
    Dojo,
    Belt,
    Day,
    Gender,
}

impl Column {
    pub fn all() -> &'static [Column] {
        &[
            Self::Name,
            Self::Dob,
            Self::Dojo,
            Self::Belt,
            Self::Day,
            Self::Gender,
        ]
    }

    /// Lower-case lookup key, as header cells are normalized.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Dob => "dob",
            Self::Dojo => "dojo",
            Self::Belt => "belt",
            Self::Day => "day",
            Self::Gender => "gender",
        }
    }

    /// Header as written in the entry sheet template.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Dob => "DOB",
            Self::Dojo => "Dojo",
            Self::Belt => "Belt",
            Self::Day => "Day",
            Self::Gender => "Gender",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual rendering; `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some((*n as i64).to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Date cells pass through; text is parsed, numbers never are.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_date(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Parses ISO dates, plus the `YYYY/MM/DD` and `YYYY-MM-DD HH:MM:SS` forms that
/// spreadsheet tools tend to produce when a date column is exported as text.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// One spreadsheet row, keyed by lower-cased column header.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub row_number: usize,
    cells: HashMap<String, Cell>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    pub fn insert(&mut self, column: &str, cell: Cell) {
        self.cells.insert(column.trim().to_lowercase(), cell);
    }

    pub fn with(mut self, column: &str, cell: impl Into<Cell>) -> Self {
        self.insert(column, cell.into());
        self
    }

    pub fn get(&self, column: Column) -> Option<&Cell> {
        self.cells.get(column.key())
    }

    pub fn text(&self, column: Column) -> Option<String> {
        self.get(column).and_then(Cell::as_text)
    }

    pub fn date(&self, column: Column) -> Option<NaiveDate> {
        self.get(column).and_then(Cell::as_date)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(Cell::is_empty)
    }
}

/// A row as handed over by a reader: either readable cells or a cell-level read error.
#[derive(Debug, Clone)]
pub enum RowInput {
    Row(RawRow),
    Unreadable { row_number: usize, error: String },
}

impl RowInput {
    pub fn row_number(&self) -> usize {
        match self {
            Self::Row(row) => row.row_number,
            Self::Unreadable { row_number, .. } => *row_number,
        }
    }
}

impl From<RawRow> for RowInput {
    fn from(row: RawRow) -> Self {
        Self::Row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup_ignores_header_case() {
        let row = RawRow::new(2).with(" NAME ", "John Doe").with("Dob", "2010-05-15");
        assert_eq!(row.text(Column::Name).as_deref(), Some("John Doe"));
        assert_eq!(row.date(Column::Dob), NaiveDate::from_ymd_opt(2010, 5, 15));
        assert_eq!(row.text(Column::Dojo), None);
    }

    #[test]
    fn test_whitespace_only_text_is_empty() {
        let row = RawRow::new(3).with("name", "   ").with("dojo", Cell::Empty);
        assert!(row.is_blank());
        assert_eq!(row.text(Column::Name), None);
    }

    #[test]
    fn test_number_renders_without_fraction() {
        assert_eq!(Cell::Number(42.0).as_text().as_deref(), Some("42"));
        assert_eq!(Cell::Number(1.5).as_text().as_deref(), Some("1.5"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2011, 8, 22);
        assert_eq!(parse_date("2011-08-22"), expected);
        assert_eq!(parse_date(" 2011/08/22 "), expected);
        assert_eq!(parse_date("2011-08-22 00:00:00"), expected);
        assert_eq!(parse_date("22/08/2011"), None);
        assert_eq!(parse_date("2011-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_numbers_are_not_dates() {
        assert_eq!(Cell::Number(40000.0).as_date(), None);
    }
}
