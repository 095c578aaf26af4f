//! The local task store, seen through its command-line interface.
//!
//! Imported issues are found again by two tag filters written on the local
//! task when it is created: one for the remote project and one for the
//! remote issue number. [`LocalStore::status`] runs an `export` query with
//! those filters; [`LocalStore::add`] creates the task.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{LocalImportStatus, RemoteIssue};
use crate::error::{Error, Result};
use crate::process::{ArgumentEscaper, ProcessRunner};

/// Default name of the tag holding the remote project key.
pub const DEFAULT_PROJECT_TAG: &str = "github_project";

/// Default name of the tag holding the remote issue number.
pub const DEFAULT_ID_TAG: &str = "github_id";

/// Handle on the local store executable.
pub struct LocalStore {
    program: PathBuf,
    project_tag: String,
    id_tag: String,
    runner: Arc<dyn ProcessRunner>,
    escaper: Arc<dyn ArgumentEscaper>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("program", &self.program)
            .field("project_tag", &self.project_tag)
            .field("id_tag", &self.id_tag)
            .field("runner", &"<dyn ProcessRunner>")
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Create a store handle with the default tag names.
    pub fn new(
        program: impl Into<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
        escaper: Arc<dyn ArgumentEscaper>,
    ) -> Self {
        Self {
            program: program.into(),
            project_tag: DEFAULT_PROJECT_TAG.to_string(),
            id_tag: DEFAULT_ID_TAG.to_string(),
            runner,
            escaper,
        }
    }

    /// Use different tag names for the project and issue number filters.
    #[must_use]
    pub fn with_tags(mut self, project_tag: impl Into<String>, id_tag: impl Into<String>) -> Self {
        self.project_tag = project_tag.into();
        self.id_tag = id_tag.into();
        self
    }

    /// Path of the store executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn tag_filters(&self, project: &str, id: u64) -> [String; 2] {
        [
            format!("{}:\"{}\"", self.project_tag, project),
            format!("{}:{}", self.id_tag, id),
        ]
    }

    /// Arguments of the query for tasks tagged with `project` and `id`.
    pub fn query_arguments(&self, project: &str, id: u64) -> Vec<String> {
        let [project_filter, id_filter] = self.tag_filters(project, id);
        vec![project_filter, id_filter, "export".to_string()]
    }

    /// Arguments of the command that creates the local task for `issue`.
    ///
    /// Double quotes in the description are backslash-escaped before the
    /// whole argument list goes through the escaper.
    pub fn add_arguments(&self, issue: &RemoteIssue) -> Vec<String> {
        let description = issue.task_description().replace('"', "\\\"");
        let [project_filter, id_filter] = self.tag_filters(&issue.project, issue.id);
        vec!["add".to_string(), description, project_filter, id_filter]
    }

    /// Asks the store whether a task exists for `project` and `id`.
    ///
    /// # Errors
    ///
    /// - `Error::LaunchFailed` / `Error::TimedOut` if the store cannot be run
    /// - `Error::QueryParseFailed` if it exits successfully with output that is
    ///   not a JSON array
    /// - `Error::QueryFailed` if it exits non-zero without a JSON array
    pub async fn status(&self, project: &str, id: u64) -> Result<LocalImportStatus> {
        let command_line = self
            .escaper
            .to_command_line(&self.query_arguments(project, id));
        let output = self.runner.run(&self.program, &command_line).await?;

        let records = match serde_json::from_slice::<Vec<Value>>(&output.stdout) {
            Ok(records) => records,
            Err(source) if output.success() => return Err(Error::QueryParseFailed(source)),
            Err(_) => {
                return Err(Error::QueryFailed {
                    exit_code: output.exit_code,
                });
            }
        };

        if !output.success() {
            warn!(
                project,
                issue = id,
                exit_code = output.exit_code,
                "Local store query exited non-zero but produced records"
            );
        }

        let status = if records.is_empty() {
            LocalImportStatus::NotImported
        } else {
            LocalImportStatus::Imported
        };
        debug!(project, issue = id, %status, matches = records.len(), "Resolved local status");
        Ok(status)
    }

    /// Creates the local task for `issue`.
    ///
    /// # Errors
    ///
    /// Returns `Error::LocalStoreWriteFailed` if the store exits non-zero, or a
    /// launch error if it cannot be run.
    pub async fn add(&self, issue: &RemoteIssue) -> Result<()> {
        let command_line = self.escaper.to_command_line(&self.add_arguments(issue));
        let output = self.runner.run(&self.program, &command_line).await?;

        if !output.success() {
            warn!(
                project = %issue.project,
                issue = issue.id,
                exit_code = output.exit_code,
                "Local store refused to add task"
            );
            return Err(Error::LocalStoreWriteFailed {
                exit_code: output.exit_code,
            });
        }

        info!(project = %issue.project, issue = issue.id, "Created local task");
        Ok(())
    }
}
