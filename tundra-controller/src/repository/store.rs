//! Repo store repository
//!
//! Loading repos and persisting their observed state.

use async_trait::async_trait;
use tundra_client::{Result, StoreClient};
use tundra_core::domain::repo::{Repo, RepoId, RepoStatus};

/// Access to the repo resources held by the store
#[async_trait]
pub trait RepoStore: Send + Sync {
    /// Lists every repo, used by the watcher for change detection and resync
    async fn list_repos(&self) -> Result<Vec<Repo>>;

    /// Loads a single repo with its current status
    async fn get_repo(&self, id: &RepoId) -> Result<Repo>;

    /// Replaces the repo's status sub-document
    async fn patch_status(&self, id: &RepoId, status: &RepoStatus) -> Result<()>;
}

#[async_trait]
impl RepoStore for StoreClient {
    async fn list_repos(&self) -> Result<Vec<Repo>> {
        StoreClient::list_repos(self).await
    }

    async fn get_repo(&self, id: &RepoId) -> Result<Repo> {
        StoreClient::get_repo(self, id).await
    }

    async fn patch_status(&self, id: &RepoId, status: &RepoStatus) -> Result<()> {
        StoreClient::patch_status(self, id, status).await.map(|_| ())
    }
}
