//! Error types for data-sweeper.

use sweeper_sheet::SheetError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type SweepResult<T> = Result<T, SweepError>;

/// Errors that can occur in the file transform pipeline.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The file extension is neither `.csv` nor `.xlsx`.
    #[error("Unsupported file type: {extension}")]
    UnsupportedFileType { name: String, extension: String },

    /// No loaded file has this name.
    #[error("File not found in session: {0}")]
    FileNotFound(String),

    /// Table codec error while loading or exporting.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SweepError {
    /// Create an unsupported file type error for a file name.
    pub fn unsupported(name: impl Into<String>, extension: Option<&str>) -> Self {
        Self::UnsupportedFileType {
            name: name.into(),
            extension: extension.map_or_else(|| "(none)".to_string(), |ext| format!(".{ext}")),
        }
    }

    /// Whether this is the recognised "skip this file" condition.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFileType { .. })
    }
}
