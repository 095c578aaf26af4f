//! Configuration file handling.
//!
//! tasksync reads a single YAML file, `~/.tasksync.yaml` by default, once at
//! startup. Keys are kebab-case:
//!
//! ```yaml
//! local-store-path: /usr/bin/task
//! projects:
//!   - acme/widgets
//! access-token: ghp_xxx          # optional
//! project-tag: github_project    # optional
//! id-tag: github_id              # optional
//! process-timeout-secs: 30       # optional
//! serialize-store-access: false  # optional
//! api-url: https://api.github.com
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::error::{Error, Result};
use crate::remote::github::GITHUB_API_URL;
use crate::remote::split_project;
use crate::store::{DEFAULT_ID_TAG, DEFAULT_PROJECT_TAG};

/// Name of the configuration file in the home directory
pub const CONFIG_FILE_NAME: &str = ".tasksync.yaml";

/// Environment variable overriding `access-token`
pub const ACCESS_TOKEN_ENV: &str = "TASKSYNC_ACCESS_TOKEN";

/// Default bound on a local store invocation, in seconds
pub const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 30;

/// Typed contents of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Path of the local store executable
    pub local_store_path: PathBuf,

    /// Remote projects, as `owner/repo`
    pub projects: Vec<String>,

    /// Token for the remote tracker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Tag holding the remote project on local tasks
    #[serde(default = "default_project_tag")]
    pub project_tag: String,

    /// Tag holding the remote issue number on local tasks
    #[serde(default = "default_id_tag")]
    pub id_tag: String,

    /// Bound on one local store invocation
    #[serde(default = "default_timeout_secs")]
    pub process_timeout_secs: u64,

    /// Run at most one local store command at a time
    #[serde(default)]
    pub serialize_store_access: bool,

    /// Base URL of the GitHub API
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_project_tag() -> String {
    DEFAULT_PROJECT_TAG.to_string()
}

fn default_id_tag() -> String {
    DEFAULT_ID_TAG.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PROCESS_TIMEOUT_SECS
}

fn default_api_url() -> String {
    GITHUB_API_URL.to_string()
}

impl Config {
    /// Create a configuration with every optional key at its default.
    pub fn new(local_store_path: impl Into<PathBuf>, projects: Vec<String>) -> Self {
        Self {
            local_store_path: local_store_path.into(),
            projects,
            access_token: None,
            project_tag: default_project_tag(),
            id_tag: default_id_tag(),
            process_timeout_secs: default_timeout_secs(),
            serialize_store_access: false,
            api_url: default_api_url(),
        }
    }

    /// `~/.tasksync.yaml`, if a home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Load and validate a configuration file, applying the
    /// `TASKSYNC_ACCESS_TOKEN` override.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file is missing, unparseable or invalid.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config = config.with_token_override(std::env::var(ACCESS_TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as YAML.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Replace the access token with `token` when it is set and non-empty.
    #[must_use]
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.access_token = Some(token);
        }
        self
    }

    /// Check the values a file can get wrong.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.local_store_path.as_os_str().is_empty() {
            return Err(Error::Config("local-store-path must not be empty".to_string()));
        }
        if self.projects.is_empty() {
            return Err(Error::Config(
                "projects must list at least one owner/repo".to_string(),
            ));
        }
        for project in &self.projects {
            split_project(project).map_err(|e| Error::Config(e.to_string()))?;
        }
        if self.project_tag.is_empty() || self.id_tag.is_empty() {
            return Err(Error::Config("tag names must not be empty".to_string()));
        }
        if self.process_timeout_secs == 0 {
            return Err(Error::Config(
                "process-timeout-secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Bound on one local store invocation.
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    /// Project used when a command does not name one.
    pub fn default_project(&self) -> Option<&str> {
        self.projects.first().map(String::as_str)
    }
}
