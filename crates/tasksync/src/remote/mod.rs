//! Remote issue trackers.
//!
//! The sync core only needs the list of issues for a project. Where they come
//! from sits behind [`IssueSource`]; [`GitHubIssueSource`] is the one
//! implementation.

pub mod github;

use async_trait::async_trait;

use crate::domain::RemoteIssue;
use crate::error::{Error, Result};
pub use github::GitHubIssueSource;

/// A tracker that can list every issue of a project.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetches all issues of `project`, open and closed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidProject` for a malformed project key, and
    /// `Error::Remote` or `Error::Http` if the tracker cannot be queried.
    async fn fetch_all_issues(&self, project: &str) -> Result<Vec<RemoteIssue>>;
}

/// Splits an `owner/repo` project key.
///
/// # Errors
///
/// Returns `Error::InvalidProject` unless the key is exactly two non-empty
/// segments without whitespace.
pub fn split_project(project: &str) -> Result<(&str, &str)> {
    let invalid = || Error::InvalidProject(project.to_string());
    let (owner, repo) = project.split_once('/').ok_or_else(invalid)?;

    let valid_segment =
        |s: &str| !s.is_empty() && !s.contains('/') && !s.chars().any(char::is_whitespace);
    if valid_segment(owner) && valid_segment(repo) {
        Ok((owner, repo))
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn splits_owner_and_repo() {
        assert_eq!(split_project("acme/widgets").unwrap(), ("acme", "widgets"));
    }

    #[rstest]
    #[case("")]
    #[case("acme")]
    #[case("acme/")]
    #[case("/widgets")]
    #[case("acme/widgets/extra")]
    #[case("acme /widgets")]
    fn rejects_malformed_keys(#[case] project: &str) {
        assert!(matches!(
            split_project(project),
            Err(Error::InvalidProject(p)) if p == project
        ));
    }
}
