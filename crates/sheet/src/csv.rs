use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::table::{normalize_headers, Table};
use std::io::{Read, Write};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

impl Table {
    /// Load a table from CSV bytes; the first record is the header row
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        Self::from_csv_reader(bytes)
    }

    /// Load a table from a reader
    ///
    /// Records shorter than the header are padded with nulls; longer records
    /// are rejected.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false) // We handle headers ourselves
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();

        let Some(header) = records.next().transpose()? else {
            return Ok(Table::default());
        };
        let columns = normalize_headers(header.iter().map(str::to_string).collect());
        let width = columns.len();
        let mut table = Table::new(columns);

        for result in records {
            let record = result?;
            if record.len() > width {
                return Err(SheetError::TooManyFields {
                    line: record.position().map_or(0, csv::Position::line),
                    expected: width,
                    actual: record.len(),
                });
            }

            let mut row: Vec<CellValue> = record.iter().map(CellValue::parse).collect();
            row.resize(width, CellValue::Null);
            table.push_row(row)?;
        }

        Ok(table)
    }

    /// Write the table to a writer as CSV, header row first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(self.columns())?;
        for row in self.rows() {
            let record: Vec<String> = row.iter().map(CellValue::as_str).collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Serialize the table to CSV bytes
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}
