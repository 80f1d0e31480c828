use crate::cell::{CellKey, CellValue};
use crate::error::{Result, SheetError};
use std::collections::HashSet;

/// A table of named columns over row-major cell storage.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given columns
    #[must_use]
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Table {
            name: "Sheet1".to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from column names and rows
    ///
    /// # Errors
    ///
    /// Returns `SheetError::LengthMismatch` if a row's width differs from the column count.
    pub fn from_rows<S, T>(columns: Vec<S>, rows: Vec<Vec<T>>) -> Result<Self>
    where
        S: Into<String>,
        T: Into<CellValue>,
    {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect())?;
        }
        Ok(table)
    }

    /// Get the table name (the worksheet name when written as a spreadsheet)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the table name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Column names in order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows
    pub fn rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.rows.iter()
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Result<&[CellValue]> {
        self.rows
            .get(index)
            .map(Vec::as_slice)
            .ok_or(SheetError::RowIndexOutOfBounds {
                index,
                count: self.rows.len(),
            })
    }

    /// Get a cell value by row and column index (0-based)
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        if col >= self.columns.len() {
            return Err(SheetError::ColumnIndexOutOfBounds {
                index: col,
                count: self.columns.len(),
            });
        }
        Ok(&self.row(row)?[col])
    }

    /// Append a row
    ///
    /// # Errors
    ///
    /// Returns `SheetError::LengthMismatch` if the row width differs from the column count.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SheetError::LengthMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Copy of the first `n` rows
    #[must_use]
    pub fn head(&self, n: usize) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Whether a column holds only numbers and missing values.
    ///
    /// A table without rows has no numeric columns; an all-null column is numeric.
    #[must_use]
    pub fn is_numeric_column(&self, index: usize) -> bool {
        index < self.columns.len()
            && !self.rows.is_empty()
            && self
                .rows
                .iter()
                .all(|row| row[index].is_null() || row[index].is_numeric())
    }

    /// Indices of numeric columns in column order
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&idx| self.is_numeric_column(idx))
            .collect()
    }

    /// Arithmetic mean of the numeric, non-null cells of a column; NaN is skipped
    #[must_use]
    pub fn column_mean(&self, index: usize) -> Option<f64> {
        if index >= self.columns.len() {
            return None;
        }
        let (sum, count) = self
            .rows
            .iter()
            .filter_map(|row| row[index].as_f64())
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Remove rows that repeat an earlier row across every column.
    ///
    /// The first occurrence is kept and row order is preserved.
    /// Returns the number of rows removed.
    pub fn remove_duplicates(&mut self) -> usize {
        let before = self.rows.len();
        let keep: Vec<bool> = {
            let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(before);
            self.rows
                .iter()
                .map(|row| seen.insert(row.iter().map(CellValue::key).collect()))
                .collect()
        };

        let mut flags = keep.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(true));
        before - self.rows.len()
    }

    /// Replace missing cells of every numeric column with that column's mean.
    ///
    /// Non-numeric columns are left untouched, including their missing cells.
    /// Returns the number of cells filled.
    pub fn fill_missing_with_mean(&mut self) -> usize {
        let means: Vec<(usize, f64)> = self
            .numeric_columns()
            .into_iter()
            .filter_map(|idx| self.column_mean(idx).map(|mean| (idx, mean)))
            .collect();

        let mut filled = 0;
        for row in &mut self.rows {
            for &(idx, mean) in &means {
                if row[idx].is_null() {
                    row[idx] = CellValue::Float(mean);
                    filled += 1;
                }
            }
        }
        filled
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new(Vec::<String>::new())
    }
}

/// Turn raw header cells into unique column names.
///
/// Blank names become `Unnamed: <index>` and repeats get `.1`, `.2`, ... suffixes.
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut names = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while used.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }

    names
}
