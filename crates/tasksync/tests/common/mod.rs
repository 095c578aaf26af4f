//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tasksync::domain::{RemoteIssue, RemoteState};
use tasksync::process::{CygwinEscaper, ProcessOutput, ProcessRunner};
use tasksync::store::LocalStore;
use tokio::sync::Semaphore;

/// In-memory stand-in for the local store executable.
///
/// Answers `export` queries with one record per imported issue number and
/// marks issues imported on `add`. Every command line is recorded.
#[derive(Default)]
pub struct FakeStore {
    imported: Mutex<HashSet<u64>>,
    calls: Mutex<Vec<String>>,
    fail_add: AtomicBool,
    fail_queries: AtomicBool,
    query_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pretend a task for `id` already exists.
    pub fn import(&self, id: u64) {
        self.imported.lock().unwrap().insert(id);
    }

    pub fn fail_adds(&self) {
        self.fail_add.store(true, Ordering::SeqCst);
    }

    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    /// Make queries wait until the returned semaphore gets permits.
    pub fn hold_queries(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.query_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn add_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("add "))
            .collect()
    }

    pub fn query_count(&self) -> usize {
        self.calls().iter().filter(|c| c.ends_with(" export")).count()
    }

    fn issue_id(command_line: &str) -> Option<u64> {
        let rest = command_line.split("github_id:").nth(1)?;
        rest.split_whitespace().next()?.parse().ok()
    }

    fn output(exit_code: i32, stdout: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }
}

#[async_trait]
impl ProcessRunner for FakeStore {
    async fn run(&self, _program: &Path, command_line: &str) -> tasksync::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(command_line.to_string());
        let id = Self::issue_id(command_line);

        if command_line.starts_with("add ") {
            if self.fail_add.load(Ordering::SeqCst) {
                return Ok(Self::output(1, ""));
            }
            if let Some(id) = id {
                self.import(id);
            }
            return Ok(Self::output(0, ""));
        }

        let gate = self.query_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.fail_queries.load(Ordering::SeqCst) {
            return Ok(Self::output(2, ""));
        }
        let found = id.is_some_and(|id| self.imported.lock().unwrap().contains(&id));
        if found {
            Ok(Self::output(0, r#"[{"uuid":"5f1c","status":"pending"}]"#))
        } else {
            Ok(Self::output(0, "[]"))
        }
    }
}

/// A `LocalStore` backed by `fake`.
pub fn local_store(fake: &Arc<FakeStore>) -> Arc<LocalStore> {
    Arc::new(LocalStore::new(
        "task",
        Arc::clone(fake) as Arc<dyn ProcessRunner>,
        Arc::new(CygwinEscaper),
    ))
}

pub fn issue(id: u64, title: &str) -> RemoteIssue {
    RemoteIssue {
        id,
        project: "acme/widgets".to_string(),
        title: title.to_string(),
        state: RemoteState::Open,
        assignees: vec![],
    }
}

/// Write an executable shell script standing in for the local store.
///
/// The script logs its arguments one per line to `calls.log` in `dir`,
/// creates a marker file on `add` and answers queries with one record once
/// the marker exists.
#[cfg(unix)]
pub fn write_store_script(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join("calls.log");
    let marker = dir.join("imported");
    let script = format!(
        r#"#!/bin/sh
for arg in "$@"; do printf '%s\n' "$arg" >> '{log}'; done
case "$1" in
  add) touch '{marker}' ;;
  *) if [ -f '{marker}' ]; then printf '[{{"uuid":"1"}}]'; else printf '[]'; fi ;;
esac
"#,
        log = log.display(),
        marker = marker.display(),
    );

    let path = dir.join("fake-task");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments the script was called with, one per line.
pub fn script_calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}
