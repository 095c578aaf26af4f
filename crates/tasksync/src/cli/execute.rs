//! Command execution logic.

use anyhow::{Result, bail};
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::args::{ImportArgs, InitArgs, ListArgs, StatusArgs};
use crate::app::App;
use crate::collection::IssueCollection;
use crate::config::Config;
use crate::domain::{IssueFilter, LocalImportStatus, SyncOutcome};
use crate::error::Error;
use crate::output::{self, ImportReport, IssueRow, OutputMode};
use crate::sync::IssueSyncState;

/// Execute the init command
pub async fn execute_init(
    args: &InitArgs,
    config_path: Option<&Path>,
    output_mode: OutputMode,
) -> Result<()> {
    use crate::commands::init;

    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine the home directory; pass --config"))?,
    };

    let result = init::init(&path, &args.store_path, &args.projects, args.force).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "config_file": result.config_file.display().to_string(),
            "local_store_path": result.config.local_store_path.display().to_string(),
            "projects": result.config.projects,
        }))?,
        OutputMode::Text => {
            println!("Wrote {}", result.config_file.display());
            println!("  Local store: {}", result.config.local_store_path.display());
            println!("  Projects:    {}", result.config.projects.join(", "));
        }
    }
    Ok(())
}

/// Execute the list command
pub async fn execute_list(app: &App, args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let project = app.project(args.project.as_deref())?;
    let collection = app.collection(&project).await?;

    let filter = IssueFilter {
        state: args.state.map(Into::into),
        assignee: args.assignee.clone(),
    };
    let states = collection.filter(&filter);
    let statuses = IssueCollection::resolve_all(&states).await;

    let rows: Vec<_> = states
        .iter()
        .zip(statuses)
        .map(|(state, status)| IssueRow::new(state.issue(), status))
        .collect();
    output::print_issue_rows(&rows, output_mode)?;
    Ok(())
}

/// Execute the status command
pub async fn execute_status(app: &App, args: &StatusArgs, output_mode: OutputMode) -> Result<()> {
    let project = app.project(args.project.as_deref())?;
    let collection = app.collection(&project).await?;
    let state = find(&collection, &project, args.id)?;

    let status = settled_status(&state).await;
    output::print_status(&IssueRow::new(state.issue(), status), output_mode)?;
    Ok(())
}

/// Execute the import command
///
/// Issues are imported concurrently. Fails if any issue could not be
/// imported, after every result has been printed.
pub async fn execute_import(app: &App, args: &ImportArgs, output_mode: OutputMode) -> Result<()> {
    let project = app.project(args.project.as_deref())?;
    let collection = app.collection(&project).await?;

    let reports = join_all(args.ids.iter().map(|&id| {
        let found = find(&collection, &project, id);
        async move {
            match found {
                Ok(state) => import_one(&state).await,
                Err(error) => ImportReport::failed(id, error),
            }
        }
    }))
    .await;

    output::print_import_reports(&reports, output_mode)?;

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        bail!("{failed} of {} import(s) failed", reports.len());
    }
    Ok(())
}

async fn import_one(state: &Arc<IssueSyncState>) -> ImportReport {
    let id = state.issue().id;
    settled_status(state).await;

    match state.sync().await {
        Ok(SyncOutcome::Skipped(LocalImportStatus::Error(detail))) => {
            ImportReport::failed(id, detail)
        }
        Ok(outcome) => {
            if outcome == SyncOutcome::Created {
                info!(issue = id, "Imported issue");
            }
            ImportReport::outcome(id, outcome)
        }
        Err(error) => ImportReport::failed(id, error),
    }
}

fn find(collection: &IssueCollection, project: &str, id: u64) -> Result<Arc<IssueSyncState>, Error> {
    collection.get(id).ok_or_else(|| Error::IssueNotFound {
        project: project.to_string(),
        id,
    })
}

async fn settled_status(state: &Arc<IssueSyncState>) -> LocalImportStatus {
    IssueCollection::resolve_all(std::slice::from_ref(state))
        .await
        .into_iter()
        .next()
        .unwrap_or(LocalImportStatus::Unresolved)
}
