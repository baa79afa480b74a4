use rust_xlsxwriter::{Format, Workbook};

use crate::Result;
use crate::row::Column;

pub const TEMPLATE_FILE_NAME: &str = "entrysheet-template.xlsx";

const SAMPLE_ROWS: [[&str; 6]; 2] = [
    ["John Doe", "2010-05-15", "Main Dojo", "Yellow", "Saturday", "Male"],
    ["Jane Smith", "2011-08-22", "East Branch", "Blue", "Sunday", "Female"],
];

/// Entry sheet with the required headers and two example athletes.
pub fn template_workbook() -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Athletes")?;

    for (col, column) in Column::all().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, column.header(), &header_format)?;
        worksheet.set_column_width(col as u16, 16)?;
    }

    for (row, values) in SAMPLE_ROWS.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            worksheet.write_string(row as u32 + 1, col as u16, *value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
