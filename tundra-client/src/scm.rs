//! Source-control endpoints
//!
//! Speaks the GitHub REST v3 dialect: branch lookup and file contents at a
//! given ref.

use reqwest::Method;
use tracing::debug;
use tundra_core::domain::repo::SourceRepo;
use tundra_core::dto::scm::{Branch, FileContent};

use crate::error::{ClientError, Result};
use crate::ApiClient;

/// Default API endpoint for github.com
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Client for a GitHub-compatible source-control API
#[derive(Debug, Clone)]
pub struct SourceControlClient {
    api: ApiClient,
}

impl SourceControlClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new(base_url),
        }
    }

    pub fn from_api(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Resolve a branch to the full SHA of its head commit
    pub async fn resolve_branch(&self, repo: &SourceRepo, branch: &str) -> Result<String> {
        let path = ["repos", repo.owner.as_str(), repo.name.as_str(), "branches", branch];

        let branch: Branch = self.api.send(self.api.request(Method::GET, &path)?).await?;
        debug!(branch = %branch.name, sha = %branch.commit.sha, "resolved branch");

        Ok(branch.commit.sha)
    }

    /// Fetch a file at `git_ref`
    ///
    /// Returns the content still in its transport encoding.
    pub async fn get_file_content(
        &self,
        repo: &SourceRepo,
        file_path: &str,
        git_ref: &str,
    ) -> Result<String> {
        let mut path = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        path.extend(file_path.split('/').filter(|s| !s.is_empty()));

        let request = self
            .api
            .request(Method::GET, &path)?
            .query(&[("ref", git_ref)]);
        let content: FileContent = self.api.send(request).await?;

        if content.encoding != "base64" {
            return Err(ClientError::ParseError(format!(
                "unsupported content encoding `{}` for {}",
                content.encoding, file_path
            )));
        }

        Ok(content.content)
    }
}

impl Default for SourceControlClient {
    fn default() -> Self {
        Self::new(GITHUB_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_github() {
        let client = SourceControlClient::default();
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_branch_names_are_escaped() {
        let client = SourceControlClient::default();
        let url = client
            .api
            .url(&["repos", "acme", "web", "branches", "release/1.2"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/web/branches/release%2F1.2"
        );
    }
}
