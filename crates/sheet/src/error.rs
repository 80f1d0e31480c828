use thiserror::Error;

/// Errors that can occur while loading, editing or saving a table
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Row index out of bounds: {index} (table has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Column index out of bounds: {index} (table has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Data length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Line {line}: expected at most {expected} fields, found {actual}")]
    TooManyFields {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Spreadsheet write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Spreadsheet too large: {0}")]
    XlsxBounds(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
