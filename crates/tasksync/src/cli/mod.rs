//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Write a configuration file
//! - `list`: List a project's issues with their local import status
//! - `status`: Show one issue's local import status
//! - `import`: Create local tasks for issues that have none
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--config`: Configuration file to use instead of `~/.tasksync.yaml`
//!
//! # Example
//!
//! ```bash
//! tasksync init --store-path /usr/bin/task --project acme/widgets
//! tasksync list --state open --assignee alice
//! tasksync import 42 43
//! ```

mod args;
mod execute;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{ImportArgs, InitArgs, ListArgs, StatusArgs};
pub use types::StateArg;

/// tasksync - import remote tracker issues as local tasks
///
/// Lists the issues of a GitHub project, shows which of them already have a
/// task in the local store, and creates the missing ones.
#[derive(Parser, Debug)]
#[command(name = "tasksync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (default: ~/.tasksync.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a configuration file
    ///
    /// Records the local store executable and the projects to track.
    /// Refuses to overwrite an existing file unless `--force` is given.
    Init(InitArgs),

    /// List issues with their local import status
    ///
    /// Every listed issue's status is resolved concurrently, one local store
    /// query per issue.
    List(ListArgs),

    /// Show the local import status of one issue
    Status(StatusArgs),

    /// Create local tasks for the given issues
    ///
    /// Issues that already have a task are skipped. Exits non-zero if any
    /// issue could not be imported.
    Import(ImportArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let config = self.config.as_deref();

        match &self.command {
            Commands::Init(args) => execute::execute_init(args, config, output_mode).await,
            Commands::List(args) => {
                let app = App::load(config).await?;
                execute::execute_list(&app, args, output_mode).await
            }
            Commands::Status(args) => {
                let app = App::load(config).await?;
                execute::execute_status(&app, args, output_mode).await
            }
            Commands::Import(args) => {
                let app = App::load(config).await?;
                execute::execute_import(&app, args, output_mode).await
            }
        }
    }
}
