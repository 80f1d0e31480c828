//! Table module for data-sweeper
//!
//! Holds uploaded tabular data in memory as named columns of typed cells,
//! reads and writes it as CSV or XLSX, and provides the two cleaning
//! primitives: duplicate-row removal and mean filling of numeric columns.
//!
//! # Examples
//!
//! ## Loading from CSV
//!
//! ```
//! use sweeper_sheet::{CellValue, Table};
//!
//! let table = Table::from_csv_bytes(b"id,amount\n1,10\n1,10\n2,\n").unwrap();
//!
//! assert_eq!(table.columns(), ["id", "amount"]);
//! assert_eq!(table.row_count(), 3);
//! assert_eq!(table.get(0, 1).unwrap(), &CellValue::Int(10));
//! ```
//!
//! ## Cleaning
//!
//! ```
//! use sweeper_sheet::{CellValue, Table};
//!
//! let mut table = Table::from_csv_bytes(b"id,amount\n1,10\n1,10\n2,\n").unwrap();
//!
//! assert_eq!(table.remove_duplicates(), 1);
//! assert_eq!(table.fill_missing_with_mean(), 1);
//! assert_eq!(table.get(1, 1).unwrap(), &CellValue::Float(10.0));
//! ```
//!
//! ## Converting to a spreadsheet
//!
//! ```
//! use sweeper_sheet::Table;
//!
//! let table = Table::from_csv_bytes(b"name,score\nAlice,9.5\n").unwrap();
//! let bytes = table.to_xlsx_bytes().unwrap();
//! let restored = Table::from_xlsx_bytes(&bytes).unwrap();
//!
//! assert_eq!(table, restored);
//! ```

mod cell;
mod csv;
mod error;
mod table;
mod xlsx;

/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export table error types.
pub use error::{Result, SheetError};
/// Re-export table type.
pub use table::Table;
