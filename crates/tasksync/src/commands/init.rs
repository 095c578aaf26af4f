//! Implementation of the `init` command.
//!
//! Writes a starter configuration file naming the local store executable and
//! the projects to track.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::Config;
use crate::error::{Error, Result};

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path of the written configuration file
    pub config_file: PathBuf,
    /// The configuration that was written
    pub config: Config,
}

/// Write a configuration file at `path`.
///
/// # Errors
///
/// Returns an error if:
/// - The file already exists and `force` is false
/// - The store path or a project key is invalid
/// - File system operations fail
pub async fn init(
    path: &Path,
    store_path: &Path,
    projects: &[String],
    force: bool,
) -> Result<InitResult> {
    if !force && fs::try_exists(path).await? {
        return Err(Error::Config(format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        )));
    }

    let projects = projects.iter().map(|p| p.trim().to_string()).collect();
    let config = Config::new(store_path, projects);
    config.validate()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    config.save(path).await?;

    Ok(InitResult {
        config_file: path.to_path_buf(),
        config,
    })
}
