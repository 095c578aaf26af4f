//! CLI argument structs for all commands.

use clap::Parser;
use std::path::PathBuf;

use super::types::StateArg;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path of the local store executable
    #[arg(long)]
    pub store_path: PathBuf,

    /// Remote project to track, as owner/repo (repeatable)
    #[arg(short, long = "project", required = true)]
    pub projects: Vec<String>,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Project to list (defaults to the first configured project)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Filter by remote state
    #[arg(short, long, value_enum)]
    pub state: Option<StateArg>,

    /// Filter by assignee login
    #[arg(short, long)]
    pub assignee: Option<String>,
}

/// Arguments for the `status` command
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    /// Remote issue number
    pub id: u64,

    /// Project the issue belongs to (defaults to the first configured project)
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Arguments for the `import` command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Remote issue numbers to import
    #[arg(required = true)]
    pub ids: Vec<u64>,

    /// Project the issues belong to (defaults to the first configured project)
    #[arg(short, long)]
    pub project: Option<String>,
}
