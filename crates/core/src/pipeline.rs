//! Loader and exporter stages of the file transform pipeline.

use crate::error::{SweepError, SweepResult};
use crate::format::{ConversionRequest, Download, FileFormat};
use std::path::Path;
use sweeper_sheet::Table;

/// A file as received from the user: name plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension without the dot, if the name has one.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Format implied by the extension.
    pub fn format(&self) -> SweepResult<FileFormat> {
        let ext = self.extension();
        ext.as_deref()
            .and_then(FileFormat::from_extension)
            .ok_or_else(|| SweepError::unsupported(&self.name, ext.as_deref()))
    }
}

/// Parse an uploaded file into a table according to its extension.
pub fn load(file: &UploadedFile) -> SweepResult<Table> {
    let format = file.format()?;
    let table = match format {
        FileFormat::Csv => Table::from_csv_bytes(&file.bytes)?,
        FileFormat::Xlsx => Table::from_xlsx_bytes(&file.bytes)?,
    };

    tracing::info!(
        file = %file.name,
        %format,
        rows = table.row_count(),
        columns = table.col_count(),
        "loaded file"
    );
    Ok(table)
}

/// Serialize a table into the target format under a name derived from the
/// original upload.
pub fn export(table: &Table, original_name: &str, format: FileFormat) -> SweepResult<Download> {
    let request = ConversionRequest::new(original_name, format);
    let bytes = match format {
        FileFormat::Csv => table.to_csv_bytes()?,
        FileFormat::Xlsx => table.to_xlsx_bytes()?,
    };

    tracing::debug!(
        file = %request.file_name,
        bytes = bytes.len(),
        "exported table"
    );
    Ok(Download::new(request, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::XLSX_MIME;
    use sweeper_sheet::CellValue;

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(
            UploadedFile::new("Data.CSV", "").extension().as_deref(),
            Some("csv")
        );
        assert_eq!(UploadedFile::new("README", "").extension(), None);
    }

    #[test]
    fn test_load_csv() {
        let table = load(&UploadedFile::new("people.csv", "id,name\n1,Ann\n")).unwrap();
        assert_eq!(table.columns(), ["id", "name"]);
        assert_eq!(table.get(0, 0).unwrap(), &CellValue::Int(1));
    }

    #[test]
    fn test_load_uppercase_extension() {
        assert!(load(&UploadedFile::new("PEOPLE.CSV", "id\n1\n")).is_ok());
    }

    #[test]
    fn test_load_xlsx() {
        let source = Table::from_csv_bytes(b"id,score\n1,2.5\n").unwrap();
        let bytes = source.to_xlsx_bytes().unwrap();

        let table = load(&UploadedFile::new("scores.xlsx", bytes)).unwrap();
        assert_eq!(table.get(0, 1).unwrap(), &CellValue::Float(2.5));
    }

    #[test]
    fn test_load_unsupported() {
        let err = load(&UploadedFile::new("data.txt", "a,b\n")).unwrap_err();
        assert!(matches!(
            err,
            SweepError::UnsupportedFileType { ref extension, .. } if extension == ".txt"
        ));
    }

    #[test]
    fn test_load_malformed_xlsx_is_generic_failure() {
        let err = load(&UploadedFile::new("broken.xlsx", "not a workbook")).unwrap_err();
        assert!(matches!(err, SweepError::Sheet(_)));
    }

    #[test]
    fn test_export_to_xlsx() {
        let table = load(&UploadedFile::new("Report.Csv", "a,b\n1,x\n")).unwrap();
        let download = export(&table, "Report.Csv", FileFormat::Xlsx).unwrap();

        assert_eq!(download.file_name, "Report.xlsx");
        assert_eq!(download.mime_type, XLSX_MIME);
        assert_eq!(Table::from_xlsx_bytes(&download.bytes).unwrap(), table);
    }

    #[test]
    fn test_export_to_csv() {
        let table = load(&UploadedFile::new("r.csv", "a,b\n1,x\n")).unwrap();
        let download = export(&table, "r.csv", FileFormat::Csv).unwrap();

        assert_eq!(download.file_name, "r.csv");
        assert_eq!(download.mime_type, "text/csv");
        assert_eq!(download.bytes, b"a,b\n1,x\n");
    }
}
