//! The set of issues fetched for one project.

use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{IssueFilter, LocalImportStatus, RemoteIssue, RemoteState};
use crate::store::LocalStore;
use crate::sync::IssueSyncState;

/// Reads per issue before a status superseded by refreshes is given up on.
const MAX_STALE_READS: usize = 3;

/// Owns one [`IssueSyncState`] per fetched issue.
#[derive(Debug)]
pub struct IssueCollection {
    store: Arc<LocalStore>,
    issues: Vec<Arc<IssueSyncState>>,
}

impl IssueCollection {
    /// Create an empty collection backed by `store`.
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            store,
            issues: Vec::new(),
        }
    }

    /// Create a collection holding `issues`.
    pub fn from_issues(store: Arc<LocalStore>, issues: Vec<RemoteIssue>) -> Self {
        let mut collection = Self::new(store);
        collection.replace(issues);
        collection
    }

    /// Discard every tracked issue, with its cached status, and track
    /// `issues` instead.
    pub fn replace(&mut self, issues: Vec<RemoteIssue>) {
        self.issues = issues
            .into_iter()
            .map(|issue| Arc::new(IssueSyncState::new(issue, Arc::clone(&self.store))))
            .collect();
    }

    /// Number of tracked issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// True if no issues are tracked.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Look up an issue by number.
    pub fn get(&self, id: u64) -> Option<Arc<IssueSyncState>> {
        self.issues
            .iter()
            .find(|state| state.issue().id == id)
            .cloned()
    }

    /// Distinct remote states present, in first-seen order.
    pub fn states(&self) -> Vec<RemoteState> {
        let mut states = Vec::new();
        for state in self.issues.iter().map(|s| s.issue().state) {
            if !states.contains(&state) {
                states.push(state);
            }
        }
        states
    }

    /// Distinct assignees present, in first-seen order.
    pub fn assignees(&self) -> Vec<String> {
        let mut assignees: Vec<String> = Vec::new();
        for assignee in self.issues.iter().flat_map(|s| &s.issue().assignees) {
            if !assignees.contains(assignee) {
                assignees.push(assignee.clone());
            }
        }
        assignees
    }

    /// Issues passing `filter`, ordered by their `#<id> <title>` text.
    pub fn filter(&self, filter: &IssueFilter) -> Vec<Arc<IssueSyncState>> {
        let mut matching: Vec<_> = self
            .issues
            .iter()
            .filter(|state| filter.matches(state.issue()))
            .cloned()
            .collect();
        matching.sort_by_cached_key(|state| state.issue().full_info());
        matching
    }

    /// Resolve the status of every issue in `states` concurrently.
    ///
    /// Each issue runs its own query; the returned statuses are in the same
    /// order as `states`. An issue whose read keeps being superseded by a
    /// refresh is reported as [`LocalImportStatus::Unresolved`].
    pub async fn resolve_all(states: &[Arc<IssueSyncState>]) -> Vec<LocalImportStatus> {
        join_all(states.iter().map(|state| async move {
            for _ in 0..MAX_STALE_READS {
                if let Ok(status) = state.resolve_status().await {
                    return status;
                }
            }
            debug!(
                project = %state.issue().project,
                issue = state.issue().id,
                "Status kept going stale, leaving it unresolved"
            );
            LocalImportStatus::Unresolved
        }))
        .await
    }
}
