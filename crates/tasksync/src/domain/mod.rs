//! Domain types for issue synchronization.
//!
//! This module contains the remote issue shape and the local import status
//! that tasksync computes for each issue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of an issue on the remote tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    /// Issue is open
    Open,

    /// Issue has been closed
    Closed,
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// An issue fetched from the remote tracker. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Issue number within the project
    pub id: u64,

    /// Project key, `owner/repo`
    pub project: String,

    /// Issue title
    pub title: String,

    /// Open or closed on the remote tracker
    pub state: RemoteState,

    /// Assignee login names, in tracker order
    pub assignees: Vec<String>,
}

impl RemoteIssue {
    /// Short display form, `#<id> <title>`. Issue lists are ordered by it.
    #[must_use]
    pub fn full_info(&self) -> String {
        format!("#{} {}", self.id, self.title)
    }

    /// Description used for the local task, `<project>#<id>: <title>`.
    #[must_use]
    pub fn task_description(&self) -> String {
        format!("{}#{}: {}", self.project, self.id, self.title)
    }
}

/// Whether an issue has a matching task in the local store.
///
/// This is a computed value, not a stored entity. Two statuses are equal when
/// their variants are; `Error` also compares its detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LocalImportStatus {
    /// Nothing has been asked of the local store yet
    Unresolved,

    /// A status query is in flight
    Loading,

    /// No local task carries this issue's tags
    NotImported,

    /// A local task carries this issue's tags
    Imported,

    /// The status could not be determined
    Error(String),
}

impl LocalImportStatus {
    /// Returns true once the status has settled to a definite answer or error.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Unresolved | Self::Loading)
    }
}

impl fmt::Display for LocalImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Loading => write!(f, "loading"),
            Self::NotImported => write!(f, "not imported"),
            Self::Imported => write!(f, "imported"),
            Self::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// What a sync request ended up doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// A local task was created
    Created,

    /// Nothing was created; carries the status that prevented it
    Skipped(LocalImportStatus),
}

/// Filter for listing issues
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    /// Keep only issues in this remote state
    pub state: Option<RemoteState>,

    /// Keep only issues assigned to this login
    pub assignee: Option<String>,
}

impl IssueFilter {
    /// Returns true if `issue` passes every set criterion.
    #[must_use]
    pub fn matches(&self, issue: &RemoteIssue) -> bool {
        self.state.is_none_or(|state| issue.state == state)
            && self
                .assignee
                .as_ref()
                .is_none_or(|assignee| issue.assignees.contains(assignee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn issue() -> RemoteIssue {
        RemoteIssue {
            id: 42,
            project: "acme/widgets".to_string(),
            title: "Fix crash".to_string(),
            state: RemoteState::Open,
            assignees: vec!["alice".to_string()],
        }
    }

    #[test]
    fn task_description_joins_project_id_and_title() {
        assert_eq!(issue().task_description(), "acme/widgets#42: Fix crash");
        assert_eq!(issue().full_info(), "#42 Fix crash");
    }

    #[test]
    fn status_serializes_with_detail() {
        let json = serde_json::to_value(LocalImportStatus::Error("boom".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "error", "detail": "boom"}));

        let json = serde_json::to_value(LocalImportStatus::NotImported).unwrap();
        assert_eq!(json, serde_json::json!({"status": "not_imported"}));
    }

    #[rstest]
    #[case(LocalImportStatus::Unresolved, false)]
    #[case(LocalImportStatus::Loading, false)]
    #[case(LocalImportStatus::NotImported, true)]
    #[case(LocalImportStatus::Imported, true)]
    #[case(LocalImportStatus::Error("x".to_string()), true)]
    fn settled_statuses(#[case] status: LocalImportStatus, #[case] settled: bool) {
        assert_eq!(status.is_settled(), settled);
    }

    #[rstest]
    #[case(IssueFilter::default(), true)]
    #[case(IssueFilter { state: Some(RemoteState::Open), assignee: None }, true)]
    #[case(IssueFilter { state: Some(RemoteState::Closed), assignee: None }, false)]
    #[case(IssueFilter { state: None, assignee: Some("alice".to_string()) }, true)]
    #[case(IssueFilter { state: Some(RemoteState::Open), assignee: Some("bob".to_string()) }, false)]
    fn filter_matches(#[case] filter: IssueFilter, #[case] expected: bool) {
        assert_eq!(filter.matches(&issue()), expected);
    }
}
