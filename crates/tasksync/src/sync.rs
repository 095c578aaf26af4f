//! Per-issue synchronization state.
//!
//! [`IssueSyncState`] pairs a remote issue with a lazily resolved local
//! import status and the action that creates the local task. The status is
//! cached; it is only queried again after an explicit refresh or after a
//! successful import.

use std::sync::Arc;
use tasksync_lazy::{CachePhase, LazyAsync, ResolveError};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument};

use crate::domain::{LocalImportStatus, RemoteIssue, SyncOutcome};
use crate::error::{Error, Result};
use crate::store::LocalStore;

type StatusCache = LazyAsync<LocalImportStatus, Arc<Error>>;

/// One remote issue and its local import status.
///
/// Operations on the same issue are serialized: two `sync` calls never
/// overlap. Different issues are fully independent.
pub struct IssueSyncState {
    issue: RemoteIssue,
    store: Arc<LocalStore>,
    status: StatusCache,
    operation: Mutex<()>,
}

impl std::fmt::Debug for IssueSyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueSyncState")
            .field("issue", &self.issue)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl IssueSyncState {
    /// Wrap `issue`. Nothing is queried until the status is first read.
    pub fn new(issue: RemoteIssue, store: Arc<LocalStore>) -> Self {
        let status = {
            let store = Arc::clone(&store);
            let project = issue.project.clone();
            let id = issue.id;
            LazyAsync::new(
                move || {
                    let store = Arc::clone(&store);
                    let project = project.clone();
                    async move { store.status(&project, id).await.map_err(Arc::new) }
                },
                LocalImportStatus::Unresolved,
            )
        };

        Self {
            issue,
            store,
            status,
            operation: Mutex::new(()),
        }
    }

    /// The remote issue this state tracks.
    pub fn issue(&self) -> &RemoteIssue {
        &self.issue
    }

    /// Current status, without waiting.
    ///
    /// The first call starts a status query and returns `Loading`. A failed
    /// query is reported as `Error` until the next refresh.
    pub fn current_status(&self) -> LocalImportStatus {
        match self.status.read_with_phase() {
            (_, Err(error)) => LocalImportStatus::Error(error.to_string()),
            (CachePhase::Idle | CachePhase::Loading, Ok(_)) => LocalImportStatus::Loading,
            (CachePhase::Ready | CachePhase::Failed, Ok(status)) => status,
        }
    }

    /// True if the current status is `NotImported`.
    ///
    /// Recompute it whenever [`subscribe`](Self::subscribe) reports a change;
    /// the status starts out loading and settles later.
    pub fn can_sync(&self) -> bool {
        self.current_status() == LocalImportStatus::NotImported
    }

    /// Waits for the status of the current cache generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::StaleRead` if a refresh superseded the query being
    /// awaited. Query failures are not errors here; they come back as
    /// `LocalImportStatus::Error`.
    pub async fn resolve_status(&self) -> Result<LocalImportStatus> {
        match self.status.resolve().await {
            Ok(status) => Ok(status),
            Err(ResolveError::Failed(error)) => Ok(LocalImportStatus::Error(error.to_string())),
            Err(ResolveError::Stale { .. }) => Err(Error::StaleRead),
            Err(ResolveError::Abandoned { .. }) => Ok(LocalImportStatus::Unresolved),
        }
    }

    /// Forget the cached status so the next read queries the store again.
    pub fn refresh(&self) {
        debug!(project = %self.issue.project, issue = self.issue.id, "Refreshing local status");
        self.status.reset();
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> broadcast::Receiver<LocalImportStatus> {
        self.status.subscribe()
    }

    /// Creates the local task if, and only if, none exists yet.
    ///
    /// Does nothing unless [`can_sync`](Self::can_sync) holds. Right before
    /// creating the task the store is queried again, bypassing the cache, in
    /// case the task appeared in the meantime. After a successful add the
    /// cached status is reset so the next read reflects what the store
    /// actually holds.
    ///
    /// # Errors
    ///
    /// - `Error::LocalStoreWriteFailed` if the add command exits non-zero. The
    ///   cached status is left alone, so the issue still reads `NotImported`.
    /// - Launch and query errors from the re-check or the add command.
    #[instrument(skip(self), fields(project = %self.issue.project, issue = self.issue.id))]
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let _operation = self.operation.lock().await;

        let gated = self.current_status();
        if gated != LocalImportStatus::NotImported {
            debug!(status = %gated, "Sync skipped");
            return Ok(SyncOutcome::Skipped(gated));
        }

        let fresh = self.store.status(&self.issue.project, self.issue.id).await?;
        if fresh != LocalImportStatus::NotImported {
            info!(status = %fresh, "Task appeared since the status was cached");
            self.status.reset();
            return Ok(SyncOutcome::Skipped(fresh));
        }

        self.store.add(&self.issue).await?;
        self.status.reset();
        Ok(SyncOutcome::Created)
    }
}
