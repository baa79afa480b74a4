use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Failed to read spreadsheet: {0}")]
    ReadError(String),

    #[error("Spreadsheet has no worksheet")]
    NoWorksheet,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unsupported file type: '{0}'. Expected .xlsx, .xls or .csv")]
    UnsupportedFormat(String),

    #[error("Template error: {0}")]
    TemplateError(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ImporterError {
    /// Errors that reject the uploaded file as a whole, before any row is looked at.
    pub fn is_unreadable_input(&self) -> bool {
        matches!(
            self,
            Self::ReadError(_)
                | Self::NoWorksheet
                | Self::MissingColumns(_)
                | Self::UnsupportedFormat(_)
        )
    }
}
