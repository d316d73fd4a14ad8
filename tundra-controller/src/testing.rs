//! In-memory collaborators for controller tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tundra_client::{ClientError, Result};
use tundra_core::domain::repo::{ObjectMeta, Repo, RepoId, RepoSpec, RepoStatus, SourceRepo};
use tundra_core::domain::run::{Condition, ConditionStatus};
use tundra_core::dto::engine::{CreateRun, GitBinding, PatchBinding, PipelineDefinition, Run};
use uuid::Uuid;

use crate::reconciler::{Reconciler, ReconcilerSettings};
use crate::repository::{PipelineEngine, RepoStore, SourceControl};

pub(crate) const SHA_A: &str = "abc1234aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub(crate) const SHA_B: &str = "def5678bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

pub(crate) const MANIFEST: &str = "paths:\n  - path: deploy/app.yaml\n  - path: charts/api\n    type: helm\n";

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
pub(crate) struct FakeStore {
    pub(crate) repos: Mutex<HashMap<RepoId, Repo>>,
    pub(crate) patches: AtomicUsize,
    pub(crate) fail_get: Mutex<bool>,
}

impl FakeStore {
    pub(crate) fn with_repo(repo: Repo) -> Arc<Self> {
        let store = Self::default();
        store.repos.lock().unwrap().insert(repo.id(), repo);
        Arc::new(store)
    }

    pub(crate) fn status(&self, id: &RepoId) -> RepoStatus {
        self.repos.lock().unwrap()[id].status.clone()
    }
}

#[async_trait]
impl RepoStore for FakeStore {
    async fn list_repos(&self) -> Result<Vec<Repo>> {
        Ok(self.repos.lock().unwrap().values().cloned().collect())
    }

    async fn get_repo(&self, id: &RepoId) -> Result<Repo> {
        if *self.fail_get.lock().unwrap() {
            return Err(ClientError::api_error(500, "store down"));
        }
        self.repos
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    async fn patch_status(&self, id: &RepoId, status: &RepoStatus) -> Result<()> {
        self.patches.fetch_add(1, Ordering::SeqCst);
        let mut repos = self.repos.lock().unwrap();
        let repo = repos
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
        repo.status = status.clone();
        repo.metadata.resource_version += 1;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeScm {
    pub(crate) head: Mutex<String>,
    pub(crate) manifests: Mutex<HashMap<String, String>>,
    pub(crate) delay: Mutex<Option<Duration>>,
    /// Store whose `apps/web` repo is deleted while the branch resolves
    pub(crate) delete_from: Mutex<Option<Arc<FakeStore>>>,
}

impl FakeScm {
    pub(crate) fn at(commit: &str, manifest: &str) -> Arc<Self> {
        let scm = Arc::new(Self::default());
        scm.push(commit, manifest);
        scm
    }

    pub(crate) fn push(&self, commit: &str, manifest: &str) {
        *self.head.lock().unwrap() = commit.to_string();
        self.manifests
            .lock()
            .unwrap()
            .insert(commit.to_string(), STANDARD.encode(manifest));
    }
}

#[async_trait]
impl SourceControl for FakeScm {
    async fn resolve_branch(&self, repo: &SourceRepo, branch: &str) -> Result<String> {
        assert_eq!(repo.to_string(), "acme/web");
        assert_eq!(branch, "main");

        let store = self.delete_from.lock().unwrap().take();
        if let Some(store) = store {
            store.repos.lock().unwrap().remove(&web_id());
        }

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.head.lock().unwrap().clone())
    }

    async fn get_file_content(&self, _repo: &SourceRepo, path: &str, git_ref: &str) -> Result<String> {
        assert_eq!(path, "tundra.yaml");
        self.manifests
            .lock()
            .unwrap()
            .get(git_ref)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }
}

#[derive(Default)]
pub(crate) struct FakeEngine {
    pub(crate) bindings: Mutex<HashMap<String, GitBinding>>,
    pub(crate) pipelines: Mutex<HashMap<String, PipelineDefinition>>,
    pub(crate) pipeline_writes: AtomicUsize,
    pub(crate) runs: Mutex<HashMap<String, Run>>,
    pub(crate) created_runs: Mutex<Vec<CreateRun>>,
    pub(crate) fail_binding_lookup: Mutex<bool>,
}

impl FakeEngine {
    pub(crate) fn finish(&self, name: &str, status: ConditionStatus, reason: &str) {
        let mut runs = self.runs.lock().unwrap();
        let run = runs.get_mut(name).unwrap();
        run.conditions = vec![Condition {
            condition_type: "Succeeded".to_string(),
            status,
            reason: reason.to_string(),
            message: None,
        }];
    }

    pub(crate) fn run_count(&self) -> usize {
        self.created_runs.lock().unwrap().len()
    }
}

#[async_trait]
impl PipelineEngine for FakeEngine {
    async fn get_git_binding(&self, _namespace: &str, name: &str) -> Result<GitBinding> {
        if *self.fail_binding_lookup.lock().unwrap() {
            return Err(ClientError::api_error(503, "engine unavailable"));
        }
        self.bindings
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::api_error(404, "not found"))
    }

    async fn create_git_binding(&self, binding: &GitBinding) -> Result<()> {
        self.bindings
            .lock()
            .unwrap()
            .insert(binding.name.clone(), binding.clone());
        Ok(())
    }

    async fn patch_git_binding(&self, _namespace: &str, name: &str, patch: &PatchBinding) -> Result<()> {
        let mut bindings = self.bindings.lock().unwrap();
        let binding = bindings
            .get_mut(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        binding.params = patch.params.clone();
        Ok(())
    }

    async fn get_pipeline(&self, _namespace: &str, name: &str) -> Result<PipelineDefinition> {
        self.pipelines
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn create_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()> {
        self.pipeline_writes.fetch_add(1, Ordering::SeqCst);
        self.pipelines
            .lock()
            .unwrap()
            .insert(pipeline.name.clone(), pipeline.clone());
        Ok(())
    }

    async fn update_pipeline(&self, pipeline: &PipelineDefinition) -> Result<()> {
        self.pipeline_writes.fetch_add(1, Ordering::SeqCst);
        self.pipelines
            .lock()
            .unwrap()
            .insert(pipeline.name.clone(), pipeline.clone());
        Ok(())
    }

    async fn create_run(&self, req: &CreateRun) -> Result<Run> {
        let mut created = self.created_runs.lock().unwrap();
        created.push(req.clone());

        let run = Run {
            name: format!("{}{:05}", req.generate_name, created.len()),
            namespace: req.namespace.clone(),
            uid: Some(Uuid::new_v4()),
            conditions: vec![Condition {
                condition_type: "Succeeded".to_string(),
                status: ConditionStatus::Unknown,
                reason: "Running".to_string(),
                message: None,
            }],
        };
        self.runs
            .lock()
            .unwrap()
            .insert(run.name.clone(), run.clone());
        Ok(run)
    }

    async fn get_run(&self, _namespace: &str, name: &str) -> Result<Run> {
        self.runs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::api_error(404, "run not found"))
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub(crate) fn web_repo() -> Repo {
    Repo {
        metadata: ObjectMeta {
            name: "web".to_string(),
            namespace: "apps".to_string(),
            uid: Uuid::new_v4(),
            resource_version: 1,
            generation: 1,
        },
        spec: RepoSpec {
            url: "https://github.com/acme/web.git".to_string(),
            branch: "main".to_string(),
            cluster: "prod".to_string(),
        },
        status: RepoStatus::default(),
    }
}

pub(crate) fn web_id() -> RepoId {
    RepoId::new("apps", "web")
}

pub(crate) struct Harness {
    pub(crate) store: Arc<FakeStore>,
    pub(crate) scm: Arc<FakeScm>,
    pub(crate) engine: Arc<FakeEngine>,
    pub(crate) reconciler: Arc<Reconciler>,
}

pub(crate) fn harness(manifest: &str) -> Harness {
    let store = FakeStore::with_repo(web_repo());
    let scm = FakeScm::at(SHA_A, manifest);
    let engine = Arc::new(FakeEngine::default());

    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        scm.clone(),
        engine.clone(),
        ReconcilerSettings::default(),
    ));

    Harness {
        store,
        scm,
        engine,
        reconciler,
    }
}

