//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Imported:   green  (imported tasks, created tasks)
//!   - Warning/Pending:    yellow (not imported, skipped)
//!   - Error:              red    (failed queries and imports)
//!   - Info/Reference:     cyan   (issue numbers)
//!   - Muted:              dimmed (loading, closed issues, assignees)

use colored::Colorize;

use super::OutputConfig;
use crate::domain::{LocalImportStatus, RemoteState};

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Colorize an issue number as `#<id>` (cyan).
pub(crate) fn colorize_id(id: u64, config: &OutputConfig) -> String {
    let text = format!("#{id}");
    if !config.use_colors {
        return text;
    }
    text.cyan().to_string()
}

/// Colorize a remote state, padded to `width` before coloring.
pub(crate) fn colorize_state(state: RemoteState, width: usize, config: &OutputConfig) -> String {
    let text = format!("{:<width$}", state.to_string());
    if !config.use_colors {
        return text;
    }
    match state {
        RemoteState::Open => text.white().to_string(),
        RemoteState::Closed => text.dimmed().to_string(),
    }
}

/// Colorize a local import status, padded to `width` before coloring.
pub(crate) fn colorize_status(
    status: &LocalImportStatus,
    width: usize,
    config: &OutputConfig,
) -> String {
    let text = format!("{:<width$}", status.to_string());
    if !config.use_colors {
        return text;
    }
    match status {
        LocalImportStatus::Imported => text.green().to_string(),
        LocalImportStatus::NotImported => text.yellow().to_string(),
        LocalImportStatus::Error(_) => text.red().to_string(),
        LocalImportStatus::Unresolved | LocalImportStatus::Loading => text.dimmed().to_string(),
    }
}
