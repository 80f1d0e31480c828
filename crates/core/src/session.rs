//! Per-file session state and command dispatch.
//!
//! Every user action is a [`Command`] applied to a [`FileSession`], which owns
//! its table and UI toggles and answers with a [`Status`]. Nothing here reads
//! ambient UI state; front ends keep a [`Session`] and render its views.

use crate::error::{SweepError, SweepResult};
use crate::format::{Download, FileFormat};
use crate::pipeline::{self, UploadedFile};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sweeper_sheet::Table;
use sweeper_viz::ChartSpec;

/// Most recent pipeline stage reached by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loaded,
    Cleaned,
    Visualized,
    Exported,
}

/// A user action on one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Toggle cleaning mode; the cleaning commands only run while it is on
    SetCleaning { enabled: bool },
    /// Toggle the chart
    SetChart { enabled: bool },
    /// Choose the conversion target
    SelectFormat { format: FileFormat },
    /// Drop rows that repeat an earlier row
    Deduplicate,
    /// Fill missing numeric cells with their column mean
    FillMissing,
    /// Serialize the table, to `format` or else to the selected target
    Convert {
        #[serde(default)]
        format: Option<FileFormat>,
    },
}

/// Outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    /// A toggle or selection changed
    Updated,
    /// A cleaning command arrived while cleaning mode was off; nothing changed
    CleaningDisabled,
    Deduplicated { removed: usize },
    MissingFilled { filled: usize },
    Converted(Download),
}

impl Status {
    /// User-facing confirmation text, if the status has one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Updated => None,
            Self::CleaningDisabled => Some("Enable cleaning to use this action.".to_string()),
            Self::Deduplicated { .. } => Some("Duplicates removed!".to_string()),
            Self::MissingFilled { .. } => Some("Missing values have been filled!".to_string()),
            Self::Converted(download) => Some(format!(
                "Download {} as {}",
                download.file_name,
                download.format.label()
            )),
        }
    }
}

/// One uploaded file's table plus its UI state.
#[derive(Debug, Clone)]
pub struct FileSession {
    name: String,
    source_format: FileFormat,
    table: Table,
    cleaning_enabled: bool,
    chart_enabled: bool,
    target_format: FileFormat,
    stage: Stage,
    last_status: Option<Status>,
}

impl FileSession {
    /// Start a session for a table loaded from `name`.
    pub fn new(name: impl Into<String>, source_format: FileFormat, table: Table) -> Self {
        Self {
            name: name.into(),
            source_format,
            table,
            cleaning_enabled: false,
            chart_enabled: false,
            target_format: FileFormat::default(),
            stage: Stage::Loaded,
            last_status: None,
        }
    }

    /// Load an uploaded file into a new session.
    pub fn load(file: &UploadedFile) -> SweepResult<Self> {
        let format = file.format()?;
        let table = pipeline::load(file)?;
        Ok(Self::new(&file.name, format, table))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_format(&self) -> FileFormat {
        self.source_format
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn cleaning_enabled(&self) -> bool {
        self.cleaning_enabled
    }

    #[must_use]
    pub fn chart_enabled(&self) -> bool {
        self.chart_enabled
    }

    #[must_use]
    pub fn target_format(&self) -> FileFormat {
        self.target_format
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Status returned by the most recent command.
    #[must_use]
    pub fn last_status(&self) -> Option<&Status> {
        self.last_status.as_ref()
    }

    /// Chart of the current table, when the chart is enabled.
    #[must_use]
    pub fn chart(&self) -> Option<ChartSpec> {
        self.chart_enabled
            .then(|| ChartSpec::numeric_bar(&self.table, format!("Visualization for {}", self.name)))
    }

    /// Apply a command to this file.
    ///
    /// Cleaning commands act on the table as it is now, so dedupe and fill
    /// give order-dependent results.
    pub fn apply(&mut self, command: Command) -> SweepResult<Status> {
        tracing::debug!(file = %self.name, ?command, "applying command");
        let status = match command {
            Command::SetCleaning { enabled } => {
                self.cleaning_enabled = enabled;
                Status::Updated
            }
            Command::SetChart { enabled } => {
                self.chart_enabled = enabled;
                if enabled {
                    self.stage = Stage::Visualized;
                }
                Status::Updated
            }
            Command::SelectFormat { format } => {
                self.target_format = format;
                Status::Updated
            }
            Command::Deduplicate | Command::FillMissing if !self.cleaning_enabled => {
                Status::CleaningDisabled
            }
            Command::Deduplicate => {
                let removed = self.table.remove_duplicates();
                self.stage = Stage::Cleaned;
                Status::Deduplicated { removed }
            }
            Command::FillMissing => {
                let filled = self.table.fill_missing_with_mean();
                self.stage = Stage::Cleaned;
                Status::MissingFilled { filled }
            }
            Command::Convert { format } => Status::Converted(self.export(format)?),
        };

        self.remember(&status);
        Ok(status)
    }

    /// Serialize the table, to `format` or else to the selected target.
    pub fn convert(&mut self, format: Option<FileFormat>) -> SweepResult<Download> {
        let download = self.export(format)?;
        self.last_status = Some(Status::Converted(download.without_payload()));
        Ok(download)
    }

    // Views only need the download metadata, so the payload is not kept.
    fn remember(&mut self, status: &Status) {
        self.last_status = Some(match status {
            Status::Converted(download) => Status::Converted(download.without_payload()),
            other => other.clone(),
        });
    }

    fn export(&mut self, format: Option<FileFormat>) -> SweepResult<Download> {
        let format = format.unwrap_or(self.target_format);
        let download = pipeline::export(&self.table, &self.name, format)?;
        self.stage = Stage::Exported;
        Ok(download)
    }
}

/// A file that was skipped at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub name: String,
    pub error: String,
}

/// Result of one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<Rejection>,
}

/// All files of the current session, in upload order.
#[derive(Debug, Clone, Default)]
pub struct Session {
    files: IndexMap<String, FileSession>,
    rejected: Vec<Rejection>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load each file in turn.
    ///
    /// Files with an unsupported extension are reported and skipped; any other
    /// failure aborts the batch and leaves the session unchanged. Uploading a
    /// name again replaces that file.
    pub fn upload(&mut self, files: Vec<UploadedFile>) -> SweepResult<UploadReport> {
        let mut loaded = Vec::with_capacity(files.len());
        let mut rejected = Vec::new();

        for file in files {
            match FileSession::load(&file) {
                Ok(session) => loaded.push((file.name, session)),
                Err(err) if err.is_unsupported() => {
                    tracing::warn!(file = %file.name, "{err}");
                    rejected.push(Rejection {
                        name: file.name,
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let mut report = UploadReport {
            accepted: Vec::with_capacity(loaded.len()),
            rejected: rejected.clone(),
        };
        for (name, session) in loaded {
            report.accepted.push(name.clone());
            self.files.insert(name, session);
        }
        self.rejected.extend(rejected);

        Ok(report)
    }

    /// Apply a command to the named file.
    pub fn apply(&mut self, name: &str, command: Command) -> SweepResult<Status> {
        self.get_mut(name)?.apply(command)
    }

    /// Convert the named file without changing its selected target.
    pub fn download(&mut self, name: &str, format: Option<FileFormat>) -> SweepResult<Download> {
        self.get_mut(name)?.convert(format)
    }

    pub fn get(&self, name: &str) -> SweepResult<&FileSession> {
        self.files
            .get(name)
            .ok_or_else(|| SweepError::FileNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> SweepResult<&mut FileSession> {
        self.files
            .get_mut(name)
            .ok_or_else(|| SweepError::FileNotFound(name.to_string()))
    }

    /// Loaded files in upload order.
    pub fn files(&self) -> impl Iterator<Item = &FileSession> {
        self.files.values()
    }

    /// Files skipped so far.
    #[must_use]
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Forget every file.
    pub fn clear(&mut self) {
        self.files.clear();
        self.rejected.clear();
    }
}
