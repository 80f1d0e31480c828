//! # sweeper-core
//!
//! The file transform pipeline for data-sweeper.
//!
//! This crate provides:
//! - Loading uploaded CSV/XLSX files into tables
//! - Per-file session state driven by explicit commands
//! - Export to CSV/XLSX download artifacts
//! - Display instructions for front ends

/// Error types and result aliases.
pub mod error;
/// File formats, conversion requests and downloads.
pub mod format;
/// Loader and exporter stages.
pub mod pipeline;
/// Session state and command dispatch.
pub mod session;
/// Display instructions.
pub mod view;

/// Re-export core error types.
pub use error::{SweepError, SweepResult};
pub use format::{ConversionRequest, Download, FileFormat};
pub use pipeline::{export, load, UploadedFile};
pub use session::{Command, FileSession, Rejection, Session, Stage, Status, UploadReport};
pub use view::{FileView, Preview, SessionView, ViewItem, DEFAULT_PREVIEW_ROWS};

/// Re-export the table types used across the API.
pub use sweeper_sheet::{CellValue, Table};
/// Re-export the chart type used in views.
pub use sweeper_viz::ChartSpec;
