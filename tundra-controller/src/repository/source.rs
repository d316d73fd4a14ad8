//! Source-control repository

use async_trait::async_trait;
use tundra_client::{Result, SourceControlClient};
use tundra_core::domain::repo::SourceRepo;

/// Read access to the managed repositories' source
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Resolves `branch` to the full SHA of its head commit
    async fn resolve_branch(&self, repo: &SourceRepo, branch: &str) -> Result<String>;

    /// Fetches `path` at `git_ref`, base64 encoded
    async fn get_file_content(&self, repo: &SourceRepo, path: &str, git_ref: &str)
    -> Result<String>;
}

#[async_trait]
impl SourceControl for SourceControlClient {
    async fn resolve_branch(&self, repo: &SourceRepo, branch: &str) -> Result<String> {
        SourceControlClient::resolve_branch(self, repo, branch).await
    }

    async fn get_file_content(
        &self,
        repo: &SourceRepo,
        path: &str,
        git_ref: &str,
    ) -> Result<String> {
        SourceControlClient::get_file_content(self, repo, path, git_ref).await
    }
}
