//! # sweeper-cli
//!
//! Command-line front end for data-sweeper: preview, clean, chart and
//! convert CSV/XLSX files.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sweeper_core::view::SESSION_FOOTER;
use sweeper_core::{
    Command, FileFormat, Preview, Session, Status, UploadedFile, ViewItem, DEFAULT_PREVIEW_ROWS,
};
use tracing_subscriber::EnvFilter;

/// sweep - clean and convert spreadsheet files
#[derive(Parser)]
#[command(name = "sweep")]
#[command(author, version, about = "Clean, chart and convert CSV/XLSX files", long_about = None)]
struct Cli {
    /// Files to process (.csv or .xlsx)
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Enable cleaning mode for every file
    #[arg(long)]
    clean: bool,

    /// Cleaning step to run, in the order given
    #[arg(short = 's', long = "step", value_name = "STEP")]
    steps: Vec<Step>,

    /// Write a bar chart page per file
    #[arg(long)]
    chart: bool,

    /// Convert every file to this format (csv, xlsx)
    #[arg(short = 't', long = "to", value_name = "FORMAT")]
    to: Option<FileFormat>,

    /// Directory receiving charts and converted files
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Rows shown in each preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Cleaning step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Step {
    /// Remove duplicate rows
    Dedupe,
    /// Fill missing numeric cells with the column mean
    FillMissing,
}

impl Step {
    fn command(self) -> Command {
        match self {
            Self::Dedupe => Command::Deduplicate,
            Self::FillMissing => Command::FillMissing,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}

/// Process every file named on the command line, printing to `out`.
fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let uploads = cli
        .files
        .iter()
        .map(|path| read_upload(path))
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_names(&cli.files, &uploads)?;

    let mut session = Session::new();
    let report = session.upload(uploads).context("Failed to load files")?;

    for rejection in &report.rejected {
        writeln!(
            out,
            "{} {}: {}",
            "Error:".red().bold(),
            rejection.name,
            rejection.error
        )?;
    }

    for name in &report.accepted {
        process_file(cli, &mut session, name, out)?;
    }

    writeln!(out, "{}", SESSION_FOOTER.green().bold())?;
    Ok(())
}

fn read_upload(path: &Path) -> Result<UploadedFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;
    Ok(UploadedFile::new(name, bytes))
}

/// Files are keyed by name, so two inputs with the same name cannot share a run.
fn ensure_unique_names(paths: &[PathBuf], uploads: &[UploadedFile]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(uploads.len());
    for (path, upload) in paths.iter().zip(uploads) {
        if let Some(first) = seen.insert(upload.name.as_str(), path) {
            anyhow::bail!(
                "Duplicate file name {}: {} and {} (process them in separate runs)",
                upload.name,
                first.display(),
                path.display()
            );
        }
    }
    Ok(())
}

fn process_file<W: Write>(cli: &Cli, session: &mut Session, name: &str, out: &mut W) -> Result<()> {
    for item in session.get(name)?.view(cli.preview_rows).items {
        match item {
            ViewItem::Heading { text } => writeln!(out, "\n{}", text.cyan().bold())?,
            ViewItem::Preview(preview) => print_preview(&preview, out)?,
            _ => {}
        }
    }

    if cli.clean {
        session.apply(name, Command::SetCleaning { enabled: true })?;
    }

    for step in &cli.steps {
        let status = session.apply(name, step.command())?;
        print_status(&status, out)?;
    }

    if cli.chart {
        session.apply(name, Command::SetChart { enabled: true })?;
        if let Some(chart) = session.get(name)?.chart() {
            let path = cli.out_dir.join(format!("{}.chart.html", file_stem(name)));
            write_output(&path, chart.to_html().as_bytes())?;
            writeln!(out, "Chart written to {}", path.display())?;
        }
    }

    if let Some(format) = cli.to {
        let status = session.apply(
            name,
            Command::Convert {
                format: Some(format),
            },
        )?;
        if let Status::Converted(download) = &status {
            let path = cli.out_dir.join(&download.file_name);
            if is_same_file(&path, &cli.files, name) {
                anyhow::bail!(
                    "Refusing to overwrite input file: {} (use --out-dir)",
                    path.display()
                );
            }
            write_output(&path, &download.bytes)?;
            writeln!(
                out,
                "{} -> {} ({} bytes)",
                status.message().unwrap_or_default(),
                path.display(),
                download.size
            )?;
        }
    }

    Ok(())
}

fn print_status<W: Write>(status: &Status, out: &mut W) -> Result<()> {
    let Some(message) = status.message() else {
        return Ok(());
    };
    match status {
        Status::CleaningDisabled => writeln!(out, "{}", message.yellow())?,
        _ => writeln!(out, "{}", message.green())?,
    }
    Ok(())
}

/// Print a preview as a pretty table.
fn print_preview<W: Write>(preview: &Preview, out: &mut W) -> Result<()> {
    if preview.columns.is_empty() {
        writeln!(out, "(empty table)")?;
        return Ok(());
    }

    let batch = preview_batch(preview)?;
    writeln!(out, "{}", pretty_format_batches(&[batch])?)?;
    writeln!(
        out,
        "{} of {} rows; {}",
        preview.rows.len(),
        preview.total_rows,
        column_types(preview).join(", ").dimmed()
    )?;
    Ok(())
}

/// Render preview cells as nullable string columns.
fn preview_batch(preview: &Preview) -> Result<RecordBatch> {
    let fields: Vec<Field> = preview
        .columns
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();

    let arrays: Vec<ArrayRef> = (0..preview.columns.len())
        .map(|col| {
            let values: Vec<Option<String>> = preview
                .rows
                .iter()
                .map(|row| {
                    let cell = &row[col];
                    (!cell.is_null()).then(|| cell.as_str())
                })
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// `name: type` of each column, from its first non-null cell.
fn column_types(preview: &Preview) -> Vec<String> {
    preview
        .columns
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let kind = preview
                .rows
                .iter()
                .map(|row| &row[col])
                .find(|cell| !cell.is_null())
                .map_or("null", |cell| cell.type_name());
            format!("{name}: {kind}")
        })
        .collect()
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}

/// Whether `target` is the input file that was uploaded as `name`.
fn is_same_file(target: &Path, inputs: &[PathBuf], name: &str) -> bool {
    let Ok(target) = target.canonicalize() else {
        return false;
    };
    inputs
        .iter()
        .filter(|input| input.file_name().is_some_and(|n| n.to_string_lossy() == name))
        .filter_map(|input| input.canonicalize().ok())
        .any(|input| input == target)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use std::fs;
    use sweeper_core::{CellValue, Table};
    use tempfile::TempDir;

    const AMOUNTS: &str = "id,amount\n1,10\n1,10\n2,\n";

    fn write_input(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    fn run_to_string(cli: &Cli) -> String {
        let mut out = Vec::new();
        run(cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ========================================================================
    // CLI argument parsing tests
    // ========================================================================

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["sweep", "a.csv"]);
        assert_eq!(cli.files, vec![PathBuf::from("a.csv")]);
        assert!(!cli.clean);
        assert!(!cli.chart);
        assert!(cli.steps.is_empty());
        assert!(cli.to.is_none());
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert_eq!(cli.preview_rows, 5);
    }

    #[test]
    fn test_cli_parse_steps_in_order() {
        let cli = Cli::parse_from([
            "sweep", "--clean", "-s", "fill-missing", "--step", "dedupe", "a.csv",
        ]);
        assert!(cli.clean);
        assert_eq!(cli.steps, vec![Step::FillMissing, Step::Dedupe]);
    }

    #[test]
    fn test_cli_parse_target_format() {
        let cli = Cli::parse_from(["sweep", "-t", "xlsx", "a.csv"]);
        assert_eq!(cli.to, Some(FileFormat::Xlsx));

        let cli = Cli::parse_from(["sweep", "--to", "excel", "a.csv"]);
        assert_eq!(cli.to, Some(FileFormat::Xlsx));

        assert!(Cli::try_parse_from(["sweep", "--to", "json", "a.csv"]).is_err());
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(Cli::try_parse_from(["sweep"]).is_err());
    }

    // ========================================================================
    // Preview rendering tests
    // ========================================================================

    #[test]
    fn test_preview_batch_keeps_nulls() {
        let table = Table::from_csv_bytes(AMOUNTS.as_bytes()).unwrap();
        let preview = Preview::of(&table, 5);
        let batch = preview_batch(&preview).unwrap();

        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_column_types() {
        let table = Table::from_csv_bytes(b"id,name,score,gap\n1,Ann,2.5,\n").unwrap();
        let types = column_types(&Preview::of(&table, 5));
        assert_eq!(types, vec!["id: int", "name: string", "score: float", "gap: null"]);
    }

    // ========================================================================
    // Integration tests
    // ========================================================================

    #[test]
    fn test_run_cleans_and_converts() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "amounts.csv", AMOUNTS);
        let out_dir = dir.path().join("out");

        let cli = Cli::parse_from([
            "sweep",
            "--clean",
            "-s",
            "dedupe",
            "-s",
            "fill-missing",
            "-t",
            "xlsx",
            "-o",
            path_str(&out_dir),
            path_str(&input),
        ]);
        let output = run_to_string(&cli);

        assert!(output.contains("Preview of amounts.csv"));
        assert!(output.contains("Duplicates removed!"));
        assert!(output.contains("Missing values have been filled!"));
        assert!(output.contains("All files processed successfully!"));

        let bytes = fs::read(out_dir.join("amounts.xlsx")).unwrap();
        let table = Table::from_xlsx_bytes(&bytes).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, 1).unwrap(), &CellValue::Int(10));
    }

    #[test]
    fn test_run_without_clean_flag_leaves_data() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "amounts.csv", AMOUNTS);
        let out_dir = dir.path().join("out");

        let cli = Cli::parse_from([
            "sweep",
            "-s",
            "dedupe",
            "-t",
            "csv",
            "-o",
            path_str(&out_dir),
            path_str(&input),
        ]);
        let output = run_to_string(&cli);

        assert!(output.contains("Enable cleaning to use this action."));
        assert_eq!(fs::read_to_string(out_dir.join("amounts.csv")).unwrap(), AMOUNTS);
    }

    #[test]
    fn test_run_reports_unsupported_files() {
        let dir = TempDir::new().unwrap();
        let good = write_input(&dir, "good.csv", "a\n1\n");
        let bad = write_input(&dir, "data.txt", "a\n1\n");

        let cli = Cli::parse_from(["sweep", path_str(&good), path_str(&bad)]);
        let output = run_to_string(&cli);

        assert!(output.contains("data.txt: Unsupported file type: .txt"));
        assert!(output.contains("Preview of good.csv"));
        assert!(!output.contains("Preview of data.txt"));
    }

    #[test]
    fn test_run_writes_chart() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "amounts.csv", AMOUNTS);

        let cli = Cli::parse_from([
            "sweep",
            "--chart",
            "-o",
            path_str(dir.path()),
            path_str(&input),
        ]);
        run_to_string(&cli);

        let html = fs::read_to_string(dir.path().join("amounts.chart.html")).unwrap();
        assert!(html.contains("Visualization for amounts.csv"));
        assert!(html.contains("chart.js"));
    }

    #[test]
    fn test_run_refuses_to_overwrite_input() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "amounts.csv", AMOUNTS);

        let cli = Cli::parse_from([
            "sweep",
            "-t",
            "csv",
            "-o",
            path_str(dir.path()),
            path_str(&input),
        ]);
        let mut out = Vec::new();
        assert!(run(&cli, &mut out).is_err());
        assert_eq!(fs::read_to_string(&input).unwrap(), AMOUNTS);
    }

    #[test]
    fn test_run_rejects_inputs_sharing_a_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        let first = write_input(&dir, "a/data.csv", "x\n1\n");
        let second = write_input(&dir, "b/data.csv", "y\n2\n");

        let cli = Cli::parse_from(["sweep", path_str(&first), path_str(&second)]);
        let mut out = Vec::new();
        let err = run(&cli, &mut out).unwrap_err();

        assert!(err.to_string().contains("Duplicate file name data.csv"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_missing_file_fails() {
        let cli = Cli::parse_from(["sweep", "/nonexistent/file.csv"]);
        let mut out = Vec::new();
        let err = run(&cli, &mut out).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
