pub mod batch;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod models;
pub mod normalize;
pub mod persist;
pub mod reader;
pub mod row;
pub mod template;
pub mod validator;

pub use batch::BatchImporter;
pub use config::ImportConfig;
pub use duplicate::{DuplicateKey, DuplicateLookup, NoPersisted, PersistedKeys};
pub use error::{ImporterError, Result};
pub use models::{AcceptedRow, AthleteRecord, ImportOutcome, ImportReport, ImportSummary, RowIssue};
pub use normalize::{Day, Gender, TokenTable};
pub use persist::AthleteImporter;
pub use reader::{SheetFormat, import_file, read_rows};
pub use row::{Cell, Column, RawRow, RowInput};
pub use validator::{RowValidator, SkipReason};
