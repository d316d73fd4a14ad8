//! Pipeline engine endpoints
//!
//! All engine objects are namespaced; the controller keeps them in the same
//! namespace as the repo that owns them.

use reqwest::Method;
use tundra_core::dto::engine::{CreateRun, GitBinding, PatchBinding, PipelineDefinition, Run};

use crate::error::Result;
use crate::ApiClient;

/// Client for the pipeline engine API
#[derive(Debug, Clone)]
pub struct EngineClient {
    api: ApiClient,
}

impl EngineClient {
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

    // =============================================================================
    // Git Bindings
    // =============================================================================

    pub async fn get_git_binding(&self, namespace: &str, name: &str) -> Result<GitBinding> {
        let path = object_path(namespace, "bindings", name);
        self.api.send(self.api.request(Method::GET, &path)?).await
    }

    pub async fn create_git_binding(&self, binding: &GitBinding) -> Result<GitBinding> {
        let path = collection_path(&binding.namespace, "bindings");
        self.api
            .send(self.api.request(Method::POST, &path)?.json(binding))
            .await
    }

    /// Replace the parameters of an existing binding
    pub async fn patch_git_binding(
        &self,
        namespace: &str,
        name: &str,
        patch: &PatchBinding,
    ) -> Result<()> {
        let path = object_path(namespace, "bindings", name);
        self.api
            .send_empty(self.api.request(Method::PATCH, &path)?.json(patch))
            .await
    }

    // =============================================================================
    // Pipeline Definitions
    // =============================================================================

    pub async fn get_pipeline(&self, namespace: &str, name: &str) -> Result<PipelineDefinition> {
        let path = object_path(namespace, "pipelines", name);
        self.api.send(self.api.request(Method::GET, &path)?).await
    }

    pub async fn create_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()> {
        let path = collection_path(&pipeline.namespace, "pipelines");
        self.api
            .send_empty(self.api.request(Method::POST, &path)?.json(pipeline))
            .await
    }

    /// Overwrite a pipeline definition in place
    pub async fn update_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()> {
        let path = object_path(&pipeline.namespace, "pipelines", &pipeline.name);
        self.api
            .send_empty(self.api.request(Method::PUT, &path)?.json(pipeline))
            .await
    }

    // =============================================================================
    // Runs
    // =============================================================================

    /// Start a run; the engine assigns the final name
    pub async fn create_run(&self, req: &CreateRun) -> Result<Run> {
        let path = collection_path(&req.namespace, "runs");
        self.api
            .send(self.api.request(Method::POST, &path)?.json(req))
            .await
    }

    pub async fn get_run(&self, namespace: &str, name: &str) -> Result<Run> {
        let path = object_path(namespace, "runs", name);
        self.api.send(self.api.request(Method::GET, &path)?).await
    }
}

fn collection_path<'a>(namespace: &'a str, kind: &'a str) -> [&'a str; 4] {
    ["api", "namespaces", namespace, kind]
}

fn object_path<'a>(namespace: &'a str, kind: &'a str, name: &'a str) -> [&'a str; 5] {
    ["api", "namespaces", namespace, kind, name]
}
