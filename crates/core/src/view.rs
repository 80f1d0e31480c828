//! Display instructions emitted for front ends.
//!
//! A view is plain data: the CLI prints it, the HTTP server returns it as JSON.

use crate::format::FileFormat;
use crate::session::{FileSession, Rejection, Session, Stage, Status};
use serde::Serialize;
use sweeper_sheet::{CellValue, Table};
use sweeper_viz::ChartSpec;

/// Rows shown in a file preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Closing line shown once every file has been rendered.
pub const SESSION_FOOTER: &str = "All files processed successfully!";

/// The first rows of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub total_rows: usize,
}

impl Preview {
    #[must_use]
    pub fn of(table: &Table, rows: usize) -> Self {
        let head = table.head(rows);
        Self {
            columns: head.columns().to_vec(),
            rows: head.rows().cloned().collect(),
            total_rows: table.row_count(),
        }
    }
}

/// One display instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewItem {
    Heading { text: String },
    Preview(Preview),
    CleaningControls { enabled: bool },
    Chart(ChartSpec),
    ConversionControls { selected: FileFormat },
    Success { text: String },
    Notice { text: String },
    DownloadOffer {
        label: String,
        file_name: String,
        mime_type: &'static str,
        size: usize,
    },
}

/// Everything a front end shows for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileView {
    pub name: String,
    pub stage: Stage,
    pub items: Vec<ViewItem>,
}

/// Everything a front end shows for the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub files: Vec<FileView>,
    pub rejected: Vec<Rejection>,
    pub footer: &'static str,
}

impl FileSession {
    /// Display instructions for this file's current state.
    #[must_use]
    pub fn view(&self, preview_rows: usize) -> FileView {
        let mut items = vec![
            ViewItem::Heading {
                text: format!("Preview of {}", self.name()),
            },
            ViewItem::Preview(Preview::of(self.table(), preview_rows)),
            ViewItem::CleaningControls {
                enabled: self.cleaning_enabled(),
            },
        ];

        if let Some(chart) = self.chart() {
            items.push(ViewItem::Chart(chart));
        }

        items.push(ViewItem::ConversionControls {
            selected: self.target_format(),
        });

        if let Some(status) = self.last_status() {
            let text = status.message().unwrap_or_default();
            match status {
                Status::Updated => {}
                Status::Converted(download) => items.push(ViewItem::DownloadOffer {
                    label: text,
                    file_name: download.file_name.clone(),
                    mime_type: download.mime_type,
                    size: download.size,
                }),
                Status::CleaningDisabled => items.push(ViewItem::Notice { text }),
                Status::Deduplicated { .. } | Status::MissingFilled { .. } => {
                    items.push(ViewItem::Success { text });
                }
            }
        }

        FileView {
            name: self.name().to_string(),
            stage: self.stage(),
            items,
        }
    }
}

impl Session {
    /// Display instructions for every file plus the skipped uploads.
    #[must_use]
    pub fn view(&self, preview_rows: usize) -> SessionView {
        SessionView {
            files: self.files().map(|file| file.view(preview_rows)).collect(),
            rejected: self.rejected().to_vec(),
            footer: SESSION_FOOTER,
        }
    }
}
