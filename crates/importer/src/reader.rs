use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::batch::BatchImporter;
use crate::config::ImportConfig;
use crate::duplicate::DuplicateLookup;
use crate::models::ImportOutcome;
use crate::row::{Cell, Column, RawRow, RowInput};
use crate::{ImporterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SheetFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ImporterError::UnsupportedFormat(path.display().to_string()))
    }
}

/// Reads the uploaded file into rows, numbered as the spreadsheet shows them.
///
/// Fails as a whole when the file cannot be opened or a required column is
/// missing. Completely blank rows are dropped; unreadable cells turn their row
/// into `RowInput::Unreadable`.
pub fn read_rows(bytes: &[u8], format: SheetFormat) -> Result<Vec<RowInput>> {
    match format {
        SheetFormat::Xlsx | SheetFormat::Xls => read_workbook(bytes),
        SheetFormat::Csv => read_csv(bytes),
    }
}

/// Reads `path` and runs the whole batch against `lookup`.
pub fn import_file<L>(
    path: &Path,
    config: &ImportConfig,
    coach_id: i32,
    lookup: &L,
) -> Result<ImportOutcome>
where
    L: DuplicateLookup + ?Sized,
{
    let format = SheetFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let rows = read_rows(&bytes, format)?;
    Ok(BatchImporter::new(config, coach_id).run(rows, lookup))
}

type RecordCells = std::result::Result<Vec<Cell>, String>;

fn read_workbook(bytes: &[u8]) -> Result<Vec<RowInput>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImporterError::ReadError(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImporterError::NoWorksheet)?
        .map_err(|e| ImporterError::ReadError(e.to_string()))?;

    // 1-based spreadsheet row of the header, which may not be the first row of the sheet.
    let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut sheet_rows = range.rows();
    let header: Vec<String> = sheet_rows
        .next()
        .map(|cells| cells.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    check_columns(&header)?;

    let records = sheet_rows.enumerate().map(|(idx, cells)| {
        let row_number = header_row + idx + 1;
        let record = cells
            .iter()
            .zip(&header)
            .map(|(data, column)| cell_from_data(data, column))
            .collect::<RecordCells>();
        (row_number, record)
    });

    Ok(collect_rows(&header, records))
}

fn cell_from_data(data: &Data, column: &str) -> std::result::Result<Cell, String> {
    let cell = match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::Date(datetime.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => {
            return Err(format!("Unreadable cell in column '{}': {}", column.trim(), e));
        }
    };
    Ok(cell)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<RowInput>> {
    // Fields are trimmed by hand so that newlines inside quoted cells stay countable.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let header_record = reader
        .headers()
        .map_err(|e| ImporterError::ReadError(e.to_string()))?
        .clone();
    let header: Vec<String> = header_record.iter().map(|name| name.trim().to_string()).collect();
    check_columns(&header)?;

    // Line numbers count every physical line, while a spreadsheet shows a quoted
    // multi-line cell as one row. Blank lines still count, as they do in a spreadsheet.
    let mut row_numbers = CsvRowNumbers::new(embedded_newlines(&header_record));
    let records = reader.records().enumerate().map(move |(idx, record)| match record {
        Ok(record) => {
            let row_number = row_numbers.next(
                record.position().map(|pos| pos.line() as usize),
                idx,
                embedded_newlines(&record),
            );
            let cells = record
                .iter()
                .map(|value| match value.trim() {
                    "" => Cell::Empty,
                    value => Cell::Text(value.to_string()),
                })
                .collect();
            (row_number, Ok(cells))
        }
        Err(e) => {
            let row_number = row_numbers.next(e.position().map(|pos| pos.line() as usize), idx, 0);
            (row_number, Err(format!("Unreadable row: {}", e)))
        }
    });

    Ok(collect_rows(&header, records))
}

fn embedded_newlines(record: &csv::StringRecord) -> usize {
    record.iter().map(|field| field.matches('\n').count()).sum()
}

/// Turns csv start lines into spreadsheet row numbers.
struct CsvRowNumbers {
    embedded: usize,
}

impl CsvRowNumbers {
    fn new(header_newlines: usize) -> Self {
        Self {
            embedded: header_newlines,
        }
    }

    /// `line` is where the record starts; `newlines` are those inside its quoted cells.
    fn next(&mut self, line: Option<usize>, idx: usize, newlines: usize) -> usize {
        let row_number = line
            .map(|line| line.saturating_sub(self.embedded))
            .unwrap_or(idx + 2);
        self.embedded += newlines;
        row_number
    }
}

fn check_columns(header: &[String]) -> Result<()> {
    let missing: Vec<String> = Column::all()
        .iter()
        .filter(|column| {
            !header
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case(column.key()))
        })
        .map(|column| column.header().to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImporterError::MissingColumns(missing))
    }
}

fn collect_rows<I>(header: &[String], records: I) -> Vec<RowInput>
where
    I: Iterator<Item = (usize, RecordCells)>,
{
    let mut rows = Vec::new();
    for (row_number, record) in records {
        match record {
            Ok(cells) => {
                let mut row = RawRow::new(row_number);
                for (column, cell) in header.iter().zip(cells) {
                    row.insert(column, cell);
                }
                if row.is_blank() {
                    debug!("Ignoring blank row {}", row_number);
                    continue;
                }
                rows.push(RowInput::Row(row));
            }
            Err(error) => rows.push(RowInput::Unreadable { row_number, error }),
        }
    }
    rows
}
