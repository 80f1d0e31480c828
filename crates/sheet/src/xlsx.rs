use crate::cell::{integral_f64, CellValue};
use crate::error::{Result, SheetError};
use crate::table::{normalize_headers, Table};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::io::Cursor;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) if f.is_nan() => CellValue::Null,
        // Spreadsheets store every number as a float
        Data::Float(f) => integral_f64(*f).map_or(CellValue::Float(*f), CellValue::Int),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Float(dt.as_f64()), |value| {
                CellValue::String(value.to_string())
            }),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

fn bounds_error(what: &str, index: usize) -> SheetError {
    SheetError::XlsxBounds(format!("{what} index {index} exceeds the worksheet limit"))
}

impl Table {
    /// Load a table from the first worksheet of an XLSX workbook.
    ///
    /// The first row is the header row. A workbook without worksheets loads
    /// as an empty table.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

        let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
            return Ok(Table::default());
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        // The used range may start right of column A; keep those leading columns
        let leading = range.start().map_or(0, |(_, col)| col as usize);

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            let mut table = Table::default();
            table.set_name(&sheet_name);
            return Ok(table);
        };

        let raw_header: Vec<String> = std::iter::repeat(String::new())
            .take(leading)
            .chain(header.iter().map(|cell| data_to_cell_value(cell).as_str()))
            .collect();
        let mut table = Table::new(normalize_headers(raw_header));
        table.set_name(&sheet_name);

        for row in rows {
            let cells: Vec<CellValue> = std::iter::repeat(CellValue::Null)
                .take(leading)
                .chain(row.iter().map(data_to_cell_value))
                .collect();
            table.push_row(cells)?;
        }

        Ok(table)
    }

    /// Serialize the table to XLSX bytes: one worksheet, bold header row,
    /// no index column
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        self.write_to_worksheet(worksheet)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Write header and data to a worksheet
    fn write_to_worksheet(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet.set_name(self.name())?;

        let header_format = Format::new().set_bold();
        for (col_idx, name) in self.columns().iter().enumerate() {
            let col_num = u16::try_from(col_idx).map_err(|_| bounds_error("Column", col_idx))?;
            worksheet.write_string_with_format(0, col_num, name, &header_format)?;
        }

        for (row_idx, row) in self.rows().enumerate() {
            let row_num = u32::try_from(row_idx + 1).map_err(|_| bounds_error("Row", row_idx))?;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num =
                    u16::try_from(col_idx).map_err(|_| bounds_error("Column", col_idx))?;

                match cell {
                    CellValue::Null => {} // Leave empty
                    CellValue::Float(f) if f.is_nan() => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row_num, col_num, *b)?;
                    }
                    CellValue::Int(i) => {
                        // Note: Excel stores all numbers as f64, so integers > 2^53
                        // (9,007,199,254,740,992) may lose precision
                        worksheet.write_number(row_num, col_num, *i as f64)?;
                    }
                    CellValue::Float(f) if f.is_finite() => {
                        worksheet.write_number(row_num, col_num, *f)?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_string(row_num, col_num, f.to_string())?;
                    }
                    CellValue::String(s) => {
                        worksheet.write_string(row_num, col_num, s)?;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::approx_constant)]
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["name", "age", "score", "active"],
            vec![
                vec![
                    CellValue::from("Alice"),
                    CellValue::Int(30),
                    CellValue::Float(95.5),
                    CellValue::Bool(true),
                ],
                vec![
                    CellValue::from("Bob"),
                    CellValue::Null,
                    CellValue::Float(3.14),
                    CellValue::Bool(false),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_xlsx_write_and_read() {
        let bytes = sample().to_xlsx_bytes().unwrap();
        let loaded = Table::from_xlsx_bytes(&bytes).unwrap();

        assert_eq!(loaded.columns(), ["name", "age", "score", "active"]);
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.name(), "Sheet1");
    }

    #[test]
    fn test_xlsx_types() {
        let bytes = sample().to_xlsx_bytes().unwrap();
        let loaded = Table::from_xlsx_bytes(&bytes).unwrap();

        assert!(matches!(loaded.get(0, 0).unwrap(), CellValue::String(s) if s == "Alice"));
        // Integral numbers come back as integers
        assert_eq!(loaded.get(0, 1).unwrap(), &CellValue::Int(30));
        assert!(matches!(loaded.get(0, 2).unwrap(), CellValue::Float(f) if (*f - 95.5).abs() < 1e-9));
        assert_eq!(loaded.get(0, 3).unwrap(), &CellValue::Bool(true));
        assert!(loaded.get(1, 1).unwrap().is_null());
    }

    #[test]
    fn test_xlsx_roundtrip_keeps_content() {
        let original = sample();
        let restored = Table::from_xlsx_bytes(&original.to_xlsx_bytes().unwrap()).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_xlsx_keeps_sheet_name() {
        let mut table = sample();
        table.set_name("Data");
        let loaded = Table::from_xlsx_bytes(&table.to_xlsx_bytes().unwrap()).unwrap();
        assert_eq!(loaded.name(), "Data");
    }

    #[test]
    fn test_xlsx_header_only() {
        let table = Table::new(vec!["a", "b"]);
        let loaded = Table::from_xlsx_bytes(&table.to_xlsx_bytes().unwrap()).unwrap();
        assert_eq!(loaded.columns(), ["a", "b"]);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_invalid_bytes() {
        let result = Table::from_xlsx_bytes(b"definitely not a zip archive");
        assert!(matches!(result, Err(SheetError::XlsxRead(_))));
    }
}
