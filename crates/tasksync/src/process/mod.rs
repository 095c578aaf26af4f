//! External process invocation.
//!
//! The local store is driven through its command-line interface. This module
//! provides the [`ProcessRunner`] trait that the rest of the crate talks to,
//! and [`TokioProcessRunner`], which spawns real processes.
//!
//! # Architecture
//!
//! A runner receives the executable path and a single command-line string
//! built by an [`ArgumentEscaper`]. On Windows that string is handed to the
//! process as is; elsewhere it is split back into an argument vector with the
//! same escaper, so the quoting dialect stays in one place.
//!
//! Runners never interpret output. They report the exit code and the captured
//! streams, and callers decide what those mean.

pub mod escape;

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
pub use escape::{ArgumentEscaper, CygwinEscaper};

/// Default bound on a single local store invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit code reported when the process was terminated by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// Result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Process exit code
    pub exit_code: i32,
    /// Everything the process wrote to standard output
    pub stdout: Vec<u8>,
    /// Everything the process wrote to standard error
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Returns true if the process exited with code zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns a reader over the captured standard output.
    #[must_use]
    pub fn stdout_reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.stdout.as_slice())
    }
}

/// Runs an external command line and captures its result.
///
/// Implementations must be `Send + Sync`: one runner is shared by every issue
/// and invoked concurrently for different issues.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `command_line` and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns `Error::LaunchFailed` if the program cannot be started and
    /// `Error::TimedOut` if it does not exit within the runner's bound. A
    /// non-zero exit code is not an error at this level.
    async fn run(&self, program: &Path, command_line: &str) -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
///
/// The child gets no stdin and no console window. It is killed if it
/// outlives the timeout.
#[derive(Clone)]
pub struct TokioProcessRunner {
    escaper: Arc<dyn ArgumentEscaper>,
    timeout: Duration,
    serialize: Option<Arc<Mutex<()>>>,
}

impl std::fmt::Debug for TokioProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioProcessRunner")
            .field("timeout", &self.timeout)
            .field("serialized", &self.serialize.is_some())
            .field("escaper", &"<dyn ArgumentEscaper>")
            .finish()
    }
}

impl TokioProcessRunner {
    /// Create a runner using the given quoting dialect and the default timeout.
    pub fn new(escaper: Arc<dyn ArgumentEscaper>) -> Self {
        Self {
            escaper,
            timeout: DEFAULT_TIMEOUT,
            serialize: None,
        }
    }

    /// Set the bound on a single invocation.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow only one invocation at a time across all clones of this runner.
    ///
    /// For local stores that cannot cope with concurrent writers.
    #[must_use]
    pub fn serialized(mut self) -> Self {
        self.serialize = Some(Arc::new(Mutex::new(())));
        self
    }

    fn command(&self, program: &Path, command_line: &str) -> Command {
        let mut command = Command::new(program);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.raw_arg(command_line);
            command.creation_flags(CREATE_NO_WINDOW);
        }

        #[cfg(not(windows))]
        command.args(self.escaper.split_command_line(command_line));

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn launch_failed(program: &Path, source: std::io::Error) -> Error {
        Error::LaunchFailed {
            program: program.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &Path, command_line: &str) -> Result<ProcessOutput> {
        let _permit = match &self.serialize {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        debug!(program = %program.display(), command_line, "Running local store command");

        let child = self
            .command(program, command_line)
            .spawn()
            .map_err(|e| Self::launch_failed(program, e))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| Self::launch_failed(program, e))?,
            Err(_) => {
                warn!(
                    program = %program.display(),
                    timeout_secs = self.timeout.as_secs(),
                    "Local store command timed out"
                );
                return Err(Error::TimedOut {
                    program: PathBuf::from(program),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let exit_code = output.status.code().unwrap_or_else(|| {
            warn!(program = %program.display(), "Local store command terminated by signal");
            SIGNALLED_EXIT_CODE
        });

        if !output.stderr.is_empty() {
            trace!(stderr = %String::from_utf8_lossy(&output.stderr), "Local store stderr");
        }
        debug!(exit_code, stdout_len = output.stdout.len(), "Local store command finished");

        Ok(ProcessOutput {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Read;

    fn runner() -> TokioProcessRunner {
        TokioProcessRunner::new(Arc::new(CygwinEscaper))
    }

    fn sh_line(script: &str) -> String {
        escape::to_command_line(&["-c", script])
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let output = runner()
            .run(Path::new("sh"), &sh_line("printf '[]'"))
            .await
            .unwrap();

        assert!(output.success());
        let mut stdout = String::new();
        output.stdout_reader().read_to_string(&mut stdout).unwrap();
        assert_eq!(stdout, "[]");
    }

    #[tokio::test]
    async fn non_zero_exit_is_not_an_error() {
        let output = runner()
            .run(Path::new("sh"), &sh_line("echo nope >&2; exit 3"))
            .await
            .unwrap();

        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr, b"nope\n");
    }

    #[tokio::test]
    async fn quoted_arguments_arrive_intact() {
        let output = runner()
            .run(
                Path::new("sh"),
                &escape::to_command_line(&[
                    "-c",
                    "printf '%s|' \"$@\"",
                    "sh",
                    "project:\"acme/widgets\"",
                    "two words",
                ]),
            )
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "project:\"acme/widgets\"|two words|"
        );
    }

    #[tokio::test]
    async fn missing_program_is_launch_failure() {
        let error = runner()
            .run(Path::new("/nonexistent/tasksync-store"), "export")
            .await
            .unwrap_err();

        assert!(matches!(error, Error::LaunchFailed { .. }));
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let error = runner()
            .with_timeout(Duration::from_millis(100))
            .run(Path::new("sh"), &sh_line("sleep 5"))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::TimedOut { .. }));
        assert!(error.is_launch_failure());
    }

    #[tokio::test]
    async fn serialized_runner_never_overlaps_invocations() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("markers.log");
        let script = |name: &str| {
            sh_line(&format!(
                "echo {name}-start >> '{log}'; sleep 0.2; echo {name}-end >> '{log}'",
                log = log.display()
            ))
        };
        let first = script("a");
        let second = script("b");

        let runner = runner().serialized();
        let (a, b) = tokio::join!(
            runner.run(Path::new("sh"), &first),
            runner.run(Path::new("sh"), &second),
        );
        assert!(a.unwrap().success());
        assert!(b.unwrap().success());

        let markers = std::fs::read_to_string(&log).unwrap();
        let markers: Vec<&str> = markers.lines().collect();
        assert_eq!(markers.len(), 4);
        for pair in markers.chunks(2) {
            let name = pair[0].trim_end_matches("-start");
            assert_eq!(pair[0], format!("{name}-start"), "{markers:?}");
            assert_eq!(pair[1], format!("{name}-end"), "{markers:?}");
        }
    }
}
