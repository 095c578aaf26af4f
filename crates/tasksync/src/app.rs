//! Application context for CLI command execution.
//!
//! [`App`] is built once from the configuration file and wires the process
//! runner, the local store and the remote issue source together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::collection::IssueCollection;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::process::{ArgumentEscaper, CygwinEscaper, ProcessRunner, TokioProcessRunner};
use crate::remote::{GitHubIssueSource, IssueSource, split_project};
use crate::store::LocalStore;

/// Application context for CLI operations.
pub struct App {
    config: Config,
    store: Arc<LocalStore>,
    source: Arc<dyn IssueSource>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("projects", &self.config.projects)
            .field("store", &self.store)
            .field("source", &"<dyn IssueSource>")
            .finish()
    }
}

impl App {
    /// Load the configuration at `config_path`, or at `~/.tasksync.yaml`
    /// when none is given, and build the context from it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no configuration can be found or it is
    /// invalid.
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::default_path().ok_or_else(|| {
                Error::Config("cannot determine the home directory; pass --config".to_string())
            })?,
        };
        debug!(path = %path.display(), "Loading configuration");
        Self::from_config(Config::load(&path).await?)
    }

    /// Build the context from an already loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote issue source cannot be created.
    pub fn from_config(config: Config) -> Result<Self> {
        let escaper: Arc<dyn ArgumentEscaper> = Arc::new(CygwinEscaper);

        let mut runner =
            TokioProcessRunner::new(Arc::clone(&escaper)).with_timeout(config.process_timeout());
        if config.serialize_store_access {
            runner = runner.serialized();
        }

        let source = GitHubIssueSource::new(&config.api_url, config.access_token.clone())?;
        Ok(Self::with_parts(config, Arc::new(runner), escaper, Arc::new(source)))
    }

    /// Build the context from explicit parts.
    pub fn with_parts(
        config: Config,
        runner: Arc<dyn ProcessRunner>,
        escaper: Arc<dyn ArgumentEscaper>,
        source: Arc<dyn IssueSource>,
    ) -> Self {
        let store = LocalStore::new(config.local_store_path.clone(), runner, escaper)
            .with_tags(config.project_tag.clone(), config.id_tag.clone());
        Self {
            config,
            store: Arc::new(store),
            source,
        }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the local store executable.
    pub fn store_path(&self) -> PathBuf {
        self.store.program().to_path_buf()
    }

    /// Pick the project a command works on: `requested`, or the first
    /// configured project.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidProject` for a malformed key.
    pub fn project(&self, requested: Option<&str>) -> Result<String> {
        let project = match requested {
            Some(project) => project,
            None => self
                .config
                .default_project()
                .ok_or_else(|| Error::Config("no projects configured".to_string()))?,
        };
        split_project(project)?;
        Ok(project.to_string())
    }

    /// Fetch every issue of `project` into a fresh collection.
    ///
    /// # Errors
    ///
    /// Returns the remote source's error if the issues cannot be fetched.
    pub async fn collection(&self, project: &str) -> Result<IssueCollection> {
        let issues = self.source.fetch_all_issues(project).await?;
        Ok(IssueCollection::from_issues(Arc::clone(&self.store), issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_from_initialized_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasksync.yaml");
        init::init(
            &path,
            Path::new("/opt/task"),
            &["acme/widgets".to_string(), "acme/gadgets".to_string()],
            false,
        )
        .await
        .unwrap();

        let app = App::load(Some(&path)).await.unwrap();
        assert_eq!(app.store_path(), PathBuf::from("/opt/task"));
        assert_eq!(app.project(None).unwrap(), "acme/widgets");
        assert_eq!(app.project(Some("acme/gadgets")).unwrap(), "acme/gadgets");
        assert!(matches!(
            app.project(Some("gadgets")),
            Err(Error::InvalidProject(_))
        ));
    }

    #[tokio::test]
    async fn missing_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let error = App::load(Some(&dir.path().join("absent.yaml")))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }
}
