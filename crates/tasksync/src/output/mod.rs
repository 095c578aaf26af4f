//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or JSON. Text goes
//! through [`OutputConfig`], which decides on colors and wrapping width.

pub mod color;

use serde::Serialize;
use std::env;
use std::io::{self, Write};

use crate::domain::{LocalImportStatus, RemoteIssue, RemoteState, SyncOutcome};
use color::{colorize_id, colorize_state, colorize_status, dimmed};
pub use color::{error, success, warning};

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const STATE_WIDTH: usize = 7;
const STATUS_WIDTH: usize = 14;

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Settings for text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Width titles are wrapped to.
    pub width: usize,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an OutputConfig with explicit values.
    pub fn new(width: usize, use_colors: bool) -> Self {
        Self { width, use_colors }
    }

    /// Detect the terminal width and honor `NO_COLOR`.
    pub fn from_env() -> Self {
        Self {
            width: terminal_width(),
            use_colors: env::var_os("NO_COLOR").is_none(),
        }
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| usize::from(w.0))
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

/// One line of the `list` command.
#[derive(Debug, Clone, Serialize)]
pub struct IssueRow {
    /// Remote issue number
    pub id: u64,
    /// Remote state
    pub state: RemoteState,
    /// Local import status
    pub local: LocalImportStatus,
    /// Issue title
    pub title: String,
    /// Assignee logins
    pub assignees: Vec<String>,
}

impl IssueRow {
    /// Pair an issue with its resolved status.
    pub fn new(issue: &RemoteIssue, local: LocalImportStatus) -> Self {
        Self {
            id: issue.id,
            state: issue.state,
            local,
            title: issue.title.clone(),
            assignees: issue.assignees.clone(),
        }
    }
}

/// What happened to one issue passed to `import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportResult {
    /// A local task was added
    Created,
    /// The issue was left alone because of its local status
    Skipped,
    /// The issue could not be imported
    Failed,
}

/// Result of importing one issue.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Remote issue number
    pub id: u64,
    /// Outcome of the import
    pub result: ImportResult,
    /// Status that caused the issue to be skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LocalImportStatus>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportReport {
    /// Report for a finished `sync` call.
    pub fn outcome(id: u64, outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Created => Self {
                id,
                result: ImportResult::Created,
                status: None,
                error: None,
            },
            SyncOutcome::Skipped(status) => Self {
                id,
                result: ImportResult::Skipped,
                status: Some(status),
                error: None,
            },
        }
    }

    /// Report for an issue that could not be imported.
    pub fn failed(id: u64, error: impl ToString) -> Self {
        Self {
            id,
            result: ImportResult::Failed,
            status: None,
            error: Some(error.to_string()),
        }
    }

    /// True if the import failed.
    pub fn is_failure(&self) -> bool {
        self.result == ImportResult::Failed
    }
}

/// Print the rows of the `list` command
pub fn print_issue_rows(rows: &[IssueRow], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_issue_rows(&mut handle, rows, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, rows),
    }
}

/// Print one issue with its local status
pub fn print_status(row: &IssueRow, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_issue_row(&mut handle, row, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, row),
    }
}

/// Print the per-issue results of the `import` command
pub fn print_import_reports(reports: &[ImportReport], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_import_reports(&mut handle, reports, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, reports),
    }
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn write_issue_rows<W: Write>(w: &mut W, rows: &[IssueRow], config: &OutputConfig) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "No issues found.");
    }
    for row in rows {
        write_issue_row(w, row, config)?;
    }
    writeln!(w)?;
    writeln!(w, "{} issue(s)", rows.len())
}

fn write_issue_row<W: Write>(w: &mut W, row: &IssueRow, config: &OutputConfig) -> io::Result<()> {
    let id = format!("#{}", row.id);
    let id_width = id.len().max(6);
    let indent = id_width + STATE_WIDTH + STATUS_WIDTH + 3;
    let title_width = config.width.saturating_sub(indent).max(20);

    let mut lines = textwrap::wrap(&row.title, title_width).into_iter();
    let first = lines.next().unwrap_or_default();
    writeln!(
        w,
        "{}{} {} {} {}",
        colorize_id(row.id, config),
        " ".repeat(id_width - id.len()),
        colorize_state(row.state, STATE_WIDTH, config),
        colorize_status(&row.local, STATUS_WIDTH, config),
        first
    )?;
    for line in lines {
        writeln!(w, "{:indent$}{line}", "")?;
    }
    if !row.assignees.is_empty() {
        let assignees = format!("@{}", row.assignees.join(" @"));
        writeln!(w, "{:indent$}{}", "", dimmed(&assignees, config))?;
    }
    Ok(())
}

fn write_import_reports<W: Write>(
    w: &mut W,
    reports: &[ImportReport],
    config: &OutputConfig,
) -> io::Result<()> {
    for report in reports {
        let id = colorize_id(report.id, config);
        match report.result {
            ImportResult::Created => writeln!(w, "{id} {}", success("created", config))?,
            ImportResult::Skipped => {
                let status = report
                    .status
                    .as_ref()
                    .map(|status| format!(" ({status})"))
                    .unwrap_or_default();
                writeln!(w, "{id} {}{status}", warning("skipped", config))?;
            }
            ImportResult::Failed => {
                let message = report.error.as_deref().unwrap_or("unknown error");
                writeln!(w, "{id} {}: {message}", error("failed", config))?;
            }
        }
    }
    Ok(())
}
