//! GitHub REST issue source.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{IssueSource, split_project};
use crate::domain::{RemoteIssue, RemoteState};
use crate::error::{Error, Result};

/// Public GitHub API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Issues requested per page; a shorter page is the last one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("tasksync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    state: RemoteState,
    #[serde(default)]
    assignees: Vec<GitHubUser>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

impl GitHubIssue {
    fn into_remote(self, project: &str) -> RemoteIssue {
        RemoteIssue {
            id: self.number,
            project: project.to_string(),
            title: self.title,
            state: self.state,
            assignees: self.assignees.into_iter().map(|u| u.login).collect(),
        }
    }
}

/// Lists issues through the GitHub REST API.
///
/// Pull requests are returned by the issues endpoint too and are kept.
#[derive(Clone)]
pub struct GitHubIssueSource {
    base_url: Url,
    client: Client,
    token: Option<String>,
    page_size: u32,
}

impl std::fmt::Debug for GitHubIssueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubIssueSource")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl GitHubIssueSource {
    /// Create a source talking to `base_url`, authenticating with `token` if given.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `base_url` is not a valid URL, or
    /// `Error::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with a slash.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| Error::Config(format!("invalid api-url '{base_url}': {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            base_url,
            client,
            token: token.filter(|t| !t.is_empty()),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Change how many issues are requested per page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn build_request(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Remote(format!("GitHub API error ({status}): {body}")))
    }

    async fn fetch_page(&self, owner: &str, repo: &str, page: u32) -> Result<Vec<GitHubIssue>> {
        let mut url = self
            .base_url
            .join(&format!("repos/{owner}/{repo}/issues"))
            .map_err(|e| Error::Config(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("state", "all")
            .append_pair("per_page", &self.page_size.to_string())
            .append_pair("page", &page.to_string());

        debug!(%url, "Fetching issue page");
        let response = self.build_request(url).send().await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl IssueSource for GitHubIssueSource {
    async fn fetch_all_issues(&self, project: &str) -> Result<Vec<RemoteIssue>> {
        let (owner, repo) = split_project(project)?;

        let mut issues = Vec::new();
        for page in 1.. {
            let batch = self.fetch_page(owner, repo, page).await?;
            let last = batch.len() < self.page_size as usize;
            issues.extend(batch.into_iter().map(|issue| issue.into_remote(project)));
            if last {
                break;
            }
        }

        debug!(project, count = issues.len(), "Fetched remote issues");
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn issue_json(number: u64, state: &str, assignees: &[&str]) -> serde_json::Value {
        json!({
            "number": number,
            "title": format!("Issue {number}"),
            "state": state,
            "assignees": assignees.iter().map(|a| json!({"login": a})).collect::<Vec<_>>(),
            "html_url": format!("https://github.com/acme/widgets/issues/{number}"),
        })
    }

    #[tokio::test]
    async fn fetches_until_short_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/issues"))
            .and(query_param("state", "all"))
            .and(query_param("per_page", "2"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                issue_json(1, "open", &["alice"]),
                issue_json(2, "closed", &[]),
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/issues"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([issue_json(3, "open", &[])])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = GitHubIssueSource::new(&server.uri(), None)
            .unwrap()
            .with_page_size(2);
        let issues = source.fetch_all_issues("acme/widgets").await.unwrap();

        assert_eq!(issues.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(issues[0].assignees, vec!["alice"]);
        assert_eq!(issues[1].state, RemoteState::Closed);
        assert_eq!(issues[2].project, "acme/widgets");
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer s3cret"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let source = GitHubIssueSource::new(&server.uri(), Some("s3cret".to_string())).unwrap();
        assert!(source.fetch_all_issues("acme/widgets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let source = GitHubIssueSource::new(&server.uri(), None).unwrap();
        let error = source.fetch_all_issues("acme/missing").await.unwrap_err();
        assert!(matches!(&error, Error::Remote(msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn malformed_project_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let source = GitHubIssueSource::new(&server.uri(), None).unwrap();

        let error = source.fetch_all_issues("widgets").await.unwrap_err();
        assert!(matches!(error, Error::InvalidProject(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            GitHubIssueSource::new("not a url", None),
            Err(Error::Config(_))
        ));
    }
}
