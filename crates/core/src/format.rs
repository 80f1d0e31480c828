//! Supported file formats, conversion requests and download artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// MIME type of comma-separated output.
pub const CSV_MIME: &str = "text/csv";
/// MIME type of spreadsheet output.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Tabular file formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Comma-separated text (`.csv`)
    #[default]
    Csv,
    /// Spreadsheet workbook (`.xlsx`)
    Xlsx,
}

impl FileFormat {
    /// Match a file extension, case-insensitively and with or without the dot.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if ext.eq_ignore_ascii_case("xlsx") {
            Some(Self::Xlsx)
        } else {
            None
        }
    }

    /// Extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// MIME type paired with the format.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => CSV_MIME,
            Self::Xlsx => XLSX_MIME,
        }
    }

    /// Human-readable name used in labels.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "Excel",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excel" => Ok(Self::Xlsx),
            other => Self::from_extension(other)
                .ok_or_else(|| format!("unknown format '{s}', expected csv or xlsx")),
        }
    }
}

/// Target of a conversion: format, output file name and MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRequest {
    pub format: FileFormat,
    pub file_name: String,
    pub mime_type: &'static str,
}

impl ConversionRequest {
    /// Derive the request from the uploaded file's name.
    ///
    /// The output name is the original stem plus the target extension, so
    /// `Report.CSV` converts to `Report.xlsx`.
    #[must_use]
    pub fn new(original_name: &str, format: FileFormat) -> Self {
        let stem = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("export");

        Self {
            format,
            file_name: format!("{stem}.{}", format.extension()),
            mime_type: format.mime_type(),
        }
    }
}

/// Serialized table ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub format: FileFormat,
    pub file_name: String,
    pub mime_type: &'static str,
    /// Byte length of the payload
    pub size: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Download {
    /// Pair serialized bytes with their conversion request.
    #[must_use]
    pub fn new(request: ConversionRequest, bytes: Vec<u8>) -> Self {
        Self {
            format: request.format,
            file_name: request.file_name,
            mime_type: request.mime_type,
            size: bytes.len(),
            bytes,
        }
    }

    /// Copy of the metadata with an empty payload; `size` still reports the
    /// exported length.
    #[must_use]
    pub fn without_payload(&self) -> Self {
        Self {
            format: self.format,
            file_name: self.file_name.clone(),
            mime_type: self.mime_type,
            size: self.size,
            bytes: Vec::new(),
        }
    }
}
