// SheetMend CLI - recover a clean table from a messy spreadsheet export
//
// inspect: show the raw rows so the operator can spot the header
// repair:  re-read with the chosen header row and write <stem>_repaired.xlsx

mod exit_codes;
mod util;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sheetmend_config::Settings;
use sheetmend_io::{
    CellValue, EmptyFileDiagnostic, RawLoadView, RepairError, Session, SourceFile,
    SUPPORTED_EXTENSIONS,
};

use exit_codes::{
    EXIT_EMPTY_FILE, EXIT_ERROR, EXIT_EXPORT_IO, EXIT_SUCCESS, EXIT_USAGE, repair_exit_code,
};

/// Log filter variable, e.g. `SHEETMEND_LOG=sheetmend_io=debug`
const LOG_ENV: &str = "SHEETMEND_LOG";

#[derive(Parser)]
#[command(name = "sheetmend")]
#[command(about = "Recover a clean table from a CSV or spreadsheet export with junk above the header")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/sheetmend/settings.json)
    #[arg(long, global = true, env = "SHEETMEND_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the raw rows of a file, numbered from 1, to find the header row
    #[command(after_help = "\
Examples:
  sheetmend inspect report.csv
  sheetmend inspect q3.xlsx --rows 20
  sheetmend inspect export.xls --json | jq .total_rows")]
    Inspect {
        /// File to read (csv, xlsx, xls, xlsm, xlsb, odf, ods, odt)
        file: PathBuf,

        /// Number of raw rows to show (default: preview.rows setting)
        #[arg(long, short = 'n')]
        rows: Option<usize>,

        /// Emit a JSON document instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Re-read a file with the given header row and export it as xlsx
    #[command(after_help = "\
Examples:
  sheetmend repair report.csv --header-row 3
  sheetmend repair q3.xlsx --header-row 2 --out-dir ./clean
  sheetmend repair q3.xlsx --header-row 2 -o - > q3_clean.xlsx")]
    Repair {
        /// File to read (csv, xlsx, xls, xlsm, xlsb, odf, ods, odt)
        file: PathBuf,

        /// 1-based row holding the column names
        #[arg(long, short = 'H', value_name = "N")]
        header_row: usize,

        /// Number of data rows to preview (default: preview.rows setting)
        #[arg(long, value_name = "N")]
        preview: Option<usize>,

        /// Directory for the repaired file (default: export.outputDir setting)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Exact output path, or - to write the xlsx bytes to stdout
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Build the workbook but do not write it anywhere
        #[arg(long)]
        no_save: bool,

        /// Suppress the row count and preview
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        Commands::Inspect { file, rows, json } => cmd_inspect(&settings, file, rows, json),
        Commands::Repair { file, header_row, preview, out_dir, output, no_save, quiet } => {
            let opts = RepairOptions { header_row, preview, out_dir, output, no_save, quiet };
            cmd_repair(&settings, file, opts)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// stderr-only subscriber; `log` records from the library crates are bridged in.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_EXPORT_IO, message: msg.into(), hint: None }
    }

    /// The diagnostic has already been printed; exit quietly with its code.
    pub fn empty_file() -> Self {
        Self { code: EXIT_EMPTY_FILE, message: String::new(), hint: None }
    }

    /// Create error from a pipeline error with proper exit code.
    pub fn repair(err: RepairError) -> Self {
        let code = repair_exit_code(&err);
        let hint = match &err {
            RepairError::UnsupportedFormat { .. } => {
                Some(format!("supported extensions: {}", SUPPORTED_EXTENSIONS.join(", ")))
            }
            RepairError::HeaderRowOutOfRange { row_count, .. } if *row_count > 0 => Some(format!(
                "pick a row between 1 and {}; `sheetmend inspect` shows them numbered",
                row_count
            )),
            RepairError::Decode { .. } => {
                Some("the file may be damaged or saved under the wrong extension".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError { code: EXIT_ERROR, message: err.to_string(), hint: None }
    }
}

// ============================================================================
// Reading the upload
// ============================================================================

/// Read `path` into memory, rejecting unknown extensions before touching the bytes.
fn read_source(path: &Path) -> Result<SourceFile, CliError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| CliError::args(format!("not a file: {}", path.display())))?;

    // Cheap check on the name alone; SourceFile::format repeats it after reading
    SourceFile::new(name.clone(), Vec::new()).format().map_err(CliError::repair)?;

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CliError::args(format!("file not found: {}", path.display())),
        _ => CliError::io(format!("cannot read {}: {}", path.display(), e)),
    })?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());

    Ok(SourceFile::new(name, bytes))
}

fn cell_strings(row: &[CellValue]) -> Vec<String> {
    row.iter().map(|c| c.to_string()).collect()
}

#[derive(Serialize)]
struct EmptyReport<'a> {
    file: &'a str,
    empty: bool,
    #[serde(flatten)]
    diagnostic: &'a EmptyFileDiagnostic,
}

fn write_empty_diagnostic(
    out: &mut dyn Write,
    file: &str,
    diag: &EmptyFileDiagnostic,
    json: bool,
) -> Result<(), CliError> {
    if json {
        let report = EmptyReport { file, empty: true, diagnostic: diag };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON encode: {}", e)))?;
        writeln!(out, "{}", text)?;
    } else {
        writeln!(out, "warning: '{}' contains no rows or columns", file)?;
        writeln!(out, "First bytes of the file ({} bytes total):", diag.total_bytes)?;
        writeln!(out, "{}", diag.preview)?;
    }
    Ok(())
}

// ============================================================================
// inspect
// ============================================================================

#[derive(Serialize)]
struct InspectReport {
    file: String,
    format: &'static str,
    encoding: String,
    total_rows: usize,
    total_columns: usize,
    columns: Vec<String>,
    /// First rows; row i here is spreadsheet row i + 1
    rows: Vec<Vec<CellValue>>,
}

fn cmd_inspect(settings: &Settings, file: PathBuf, rows: Option<usize>, json: bool) -> Result<(), CliError> {
    let shown = rows.unwrap_or(settings.preview_rows);
    let source = read_source(&file)?;
    let name = source.name().to_string();
    let format = source.format().map_err(CliError::repair)?;

    let mut session = Session::with_preview_bytes(settings.raw_preview_bytes);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut report = match session.load(source).map_err(CliError::repair)? {
        RawLoadView::Empty(diag) => {
            write_empty_diagnostic(&mut out, &name, diag, json)?;
            return Err(CliError::empty_file());
        }
        RawLoadView::Grid(grid) => InspectReport {
            file: name,
            format: format.label(),
            encoding: String::new(),
            total_rows: grid.row_count(),
            total_columns: grid.column_count(),
            columns: grid.column_names(),
            rows: grid.rows().iter().take(shown).cloned().collect(),
        },
    };
    report.encoding = session.encoding().map(|e| e.name().to_string()).unwrap_or_default();

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON encode: {}", e)))?;
        writeln!(out, "{}", text)?;
        return Ok(());
    }

    writeln!(out, "file:     {}", report.file)?;
    writeln!(out, "format:   {}", report.format)?;
    writeln!(out, "encoding: {}", report.encoding)?;
    writeln!(out, "shape:    {} rows x {} columns", report.total_rows, report.total_columns)?;
    writeln!(out)?;
    let rows: Vec<Vec<String>> = report.rows.iter().map(|r| cell_strings(r)).collect();
    write!(out, "{}", util::render_table(&report.columns, &rows, 1))?;
    if report.total_rows > rows.len() {
        writeln!(out, "... {} more rows", report.total_rows - rows.len())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Pick the header row with: sheetmend repair {} --header-row <N>",
        file.display()
    )?;
    Ok(())
}

// ============================================================================
// repair
// ============================================================================

struct RepairOptions {
    header_row: usize,
    preview: Option<usize>,
    out_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    no_save: bool,
    quiet: bool,
}

/// Where the artifact goes once it is built.
#[derive(Debug, PartialEq)]
enum Destination {
    Stdout,
    File(PathBuf),
    Nowhere,
}

fn destination(settings: &Settings, opts: &RepairOptions, file_name: &str) -> Destination {
    match &opts.output {
        Some(path) if path.as_os_str() == "-" => Destination::Stdout,
        Some(path) => Destination::File(path.clone()),
        // An explicit --out-dir overrides export.saveToDisk = false
        None if opts.no_save || (!settings.save_to_disk && opts.out_dir.is_none()) => Destination::Nowhere,
        None => {
            let dir = opts.out_dir.clone().unwrap_or_else(|| settings.effective_output_dir());
            Destination::File(dir.join(file_name))
        }
    }
}

fn cmd_repair(settings: &Settings, file: PathBuf, opts: RepairOptions) -> Result<(), CliError> {
    let shown = opts.preview.unwrap_or(settings.preview_rows);
    let streaming = matches!(&opts.output, Some(p) if p.as_os_str() == "-");

    // The report must not mix with workbook bytes on stdout
    let mut out: Box<dyn Write> = if streaming {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let source = read_source(&file)?;
    let name = source.name().to_string();
    let mut session = Session::with_preview_bytes(settings.raw_preview_bytes);

    if let RawLoadView::Empty(diag) = session.load(source).map_err(CliError::repair)? {
        write_empty_diagnostic(&mut out, &name, diag, false)?;
        return Err(CliError::empty_file());
    }

    let dataset = session.choose_header(opts.header_row).map_err(CliError::repair)?;
    if !opts.quiet {
        writeln!(
            out,
            "Total rows: {}, total columns: {}",
            dataset.row_count(),
            dataset.column_count()
        )?;
        let preview: Vec<Vec<String>> = dataset.preview(shown).iter().map(|r| cell_strings(r)).collect();
        write!(out, "{}", util::render_table(dataset.columns(), &preview, 1))?;
    }

    let artifact = session.export().map_err(CliError::repair)?;
    match destination(settings, &opts, &artifact.file_name) {
        Destination::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&artifact.bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| CliError::io(format!("cannot write to stdout: {}", e)))?;
        }
        Destination::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    CliError::io(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
            fs::write(&path, &artifact.bytes).map_err(|e| {
                CliError::io(format!("cannot write {}: {}", path.display(), e))
                    .with_hint("choose another location with --out-dir or -o")
            })?;
            log::info!("wrote {} bytes to {}", artifact.len(), path.display());
            if !opts.quiet {
                writeln!(out, "Saved: {}", path.display())?;
            }
        }
        Destination::Nowhere => {
            if !opts.quiet {
                writeln!(out, "Built {} ({} bytes), not saved", artifact.file_name, artifact.len())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(output: Option<&str>, out_dir: Option<&str>, no_save: bool) -> RepairOptions {
        RepairOptions {
            header_row: 1,
            preview: None,
            out_dir: out_dir.map(PathBuf::from),
            output: output.map(PathBuf::from),
            no_save,
            quiet: false,
        }
    }

    #[test]
    fn destination_prefers_explicit_output() {
        let settings = Settings::default();
        assert_eq!(
            destination(&settings, &opts(Some("-"), Some("/tmp"), false), "a_repaired.xlsx"),
            Destination::Stdout
        );
        assert_eq!(
            destination(&settings, &opts(Some("out.xlsx"), None, true), "a_repaired.xlsx"),
            Destination::File(PathBuf::from("out.xlsx"))
        );
    }

    #[test]
    fn destination_uses_out_dir_then_settings() {
        let settings = Settings { output_dir: Some(PathBuf::from("/srv/clean")), ..Settings::default() };
        assert_eq!(
            destination(&settings, &opts(None, Some("/tmp/x"), false), "a_repaired.xlsx"),
            Destination::File(PathBuf::from("/tmp/x/a_repaired.xlsx"))
        );
        assert_eq!(
            destination(&settings, &opts(None, None, false), "a_repaired.xlsx"),
            Destination::File(PathBuf::from("/srv/clean/a_repaired.xlsx"))
        );
    }

    #[test]
    fn destination_respects_no_save() {
        let settings = Settings::default();
        assert_eq!(destination(&settings, &opts(None, None, true), "a.xlsx"), Destination::Nowhere);
        let off = Settings { save_to_disk: false, ..Settings::default() };
        assert_eq!(destination(&off, &opts(None, None, false), "a.xlsx"), Destination::Nowhere);
        assert_eq!(
            destination(&off, &opts(None, Some("/tmp"), false), "a.xlsx"),
            Destination::File(PathBuf::from("/tmp/a.xlsx"))
        );
    }

    #[test]
    fn repair_error_hints() {
        let err = CliError::repair(RepairError::HeaderRowOutOfRange { requested: 9, row_count: 4 });
        assert_eq!(err.code, exit_codes::EXIT_HEADER_ROW);
        assert!(err.hint.unwrap().contains("between 1 and 4"));

        let err = CliError::repair(RepairError::UnsupportedFormat { extension: "pdf".into() });
        assert_eq!(err.code, exit_codes::EXIT_UNSUPPORTED_FORMAT);
        assert!(err.hint.unwrap().contains("csv"));
    }

    #[test]
    fn read_source_rejects_extension_before_reading() {
        // The path does not exist; the extension check must fire first
        let err = read_source(Path::new("/nonexistent/slides.pptx")).unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_UNSUPPORTED_FORMAT);

        let err = read_source(Path::new("/nonexistent/data.csv")).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }
}
