//! Resource store endpoints
//!
//! The store holds the repo resources: users write their spec, the
//! controller patches their status.

use reqwest::Method;
use tundra_core::domain::repo::{Repo, RepoId, RepoSpec, RepoStatus};
use tundra_core::dto::store::CreateRepo;

use crate::error::Result;
use crate::ApiClient;

/// Client for the resource store API
#[derive(Debug, Clone)]
pub struct StoreClient {
    api: ApiClient,
}

impl StoreClient {
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

    /// List every repo in every namespace
    pub async fn list_repos(&self) -> Result<Vec<Repo>> {
        self.api
            .send(self.api.request(Method::GET, &["api", "repos"])?)
            .await
    }

    /// Get a repo by identity
    ///
    /// A missing repo surfaces as an error for which
    /// [`ClientError::is_not_found`](crate::ClientError::is_not_found) is true.
    pub async fn get_repo(&self, id: &RepoId) -> Result<Repo> {
        self.api
            .send(self.api.request(Method::GET, &repo_path(id))?)
            .await
    }

    /// Create a repo in `namespace`
    pub async fn create_repo(&self, namespace: &str, name: &str, spec: RepoSpec) -> Result<Repo> {
        let path = ["api", "namespaces", namespace, "repos"];
        let req = CreateRepo {
            name: name.to_string(),
            spec,
        };

        self.api
            .send(self.api.request(Method::POST, &path)?.json(&req))
            .await
    }

    /// Replace the status sub-document of a repo
    pub async fn patch_status(&self, id: &RepoId, status: &RepoStatus) -> Result<Repo> {
        let [api, namespaces, namespace, repos, name] = repo_path(id);
        let path = [api, namespaces, namespace, repos, name, "status"];

        self.api
            .send(self.api.request(Method::PATCH, &path)?.json(status))
            .await
    }
}

fn repo_path(id: &RepoId) -> [&str; 5] {
    ["api", "namespaces", id.namespace.as_str(), "repos", id.name.as_str()]
}
