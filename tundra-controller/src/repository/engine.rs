//! Pipeline engine repository

use async_trait::async_trait;
use tundra_client::{EngineClient, Result};
use tundra_core::dto::engine::{CreateRun, GitBinding, PatchBinding, PipelineDefinition, Run};

/// Operations the reconciler needs from the pipeline engine
#[async_trait]
pub trait PipelineEngine: Send + Sync {
    async fn get_git_binding(&self, namespace: &str, name: &str) -> Result<GitBinding>;

    async fn create_git_binding(&self, binding: &GitBinding) -> Result<()>;

    /// Replaces the binding's parameters, used to pin a revision
    async fn patch_git_binding(&self, namespace: &str, name: &str, patch: &PatchBinding)
    -> Result<()>;

    async fn get_pipeline(&self, namespace: &str, name: &str) -> Result<PipelineDefinition>;

    async fn create_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()>;

    /// Overwrites an existing pipeline definition
    async fn update_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()>;

    /// Starts a run and returns it with its engine-assigned name
    async fn create_run(&self, req: &CreateRun) -> Result<Run>;

    /// Fetches a run with its current conditions
    async fn get_run(&self, namespace: &str, name: &str) -> Result<Run>;
}

#[async_trait]
impl PipelineEngine for EngineClient {
    async fn get_git_binding(&self, namespace: &str, name: &str) -> Result<GitBinding> {
        EngineClient::get_git_binding(self, namespace, name).await
    }

    async fn create_git_binding(&self, binding: &GitBinding) -> Result<()> {
        EngineClient::create_git_binding(self, binding).await.map(|_| ())
    }

    async fn patch_git_binding(
        &self,
        namespace: &str,
        name: &str,
        patch: &PatchBinding,
    ) -> Result<()> {
        EngineClient::patch_git_binding(self, namespace, name, patch).await
    }

    async fn get_pipeline(&self, namespace: &str, name: &str) -> Result<PipelineDefinition> {
        EngineClient::get_pipeline(self, namespace, name).await
    }

    async fn create_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()> {
        EngineClient::create_pipeline(self, pipeline).await
    }

    async fn update_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()> {
        EngineClient::update_pipeline(self, pipeline).await
    }

    async fn create_run(&self, req: &CreateRun) -> Result<Run> {
        EngineClient::create_run(self, req).await
    }

    async fn get_run(&self, namespace: &str, name: &str) -> Result<Run> {
        EngineClient::get_run(self, namespace, name).await
    }
}
