//! Repo reconciler
//!
//! One pass brings the engine in line with a repo's branch:
//! 1. load the repo (gone means nothing to do)
//! 2. ensure the git binding the engine checks the repo out through
//! 3. resolve the branch to a commit
//! 4. fetch and parse the manifest at that commit
//! 5. create or overwrite the repo's pipeline definition
//! 6. trigger a run when the commit changed
//! 7. poll runs that have not finished
//! 8. requeue while any run is still going
//!
//! Any failure in stages 2-7 ends the pass. Whatever status the pass managed
//! to build is still patched back to the store.

mod error;


pub use error::ReconcileError;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, error, info, info_span, warn};
use tundra_core::domain::manifest::PipelineConfig;
use tundra_core::domain::repo::{Repo, RepoId, SourceRepo, short_sha};
use tundra_core::domain::run::RunRecord;
use tundra_core::dto::engine::{CreateRun, GitBinding, PatchBinding, PipelineDefinition};
use tundra_core::generate;

use crate::repository::{PipelineEngine, RepoStore, SourceControl};

/// What the scheduler should do after a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Wait for the next change notification or resync
    Await,
    /// Run another pass after the delay
    Requeue(Duration),
}

/// Knobs for a [`Reconciler`]
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Manifest location inside managed repositories
    pub manifest_path: String,
    /// Delay between passes while runs are outstanding
    pub requeue_after: Duration,
    /// Upper bound for any single collaborator call
    pub call_timeout: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            manifest_path: "tundra.yaml".to_string(),
            requeue_after: Duration::from_secs(3),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Reconciles repos against source control and the pipeline engine
///
/// Holds no per-repo state; the scheduler guarantees passes for the same
/// repo never overlap.
pub struct Reconciler {
    store: Arc<dyn RepoStore>,
    scm: Arc<dyn SourceControl>,
    engine: Arc<dyn PipelineEngine>,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn RepoStore>,
        scm: Arc<dyn SourceControl>,
        engine: Arc<dyn PipelineEngine>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            store,
            scm,
            engine,
            settings,
        }
    }

    /// Runs one full pass for `id`
    pub async fn reconcile(&self, id: &RepoId) -> Action {
        self.run_pass(id)
            .instrument(info_span!("reconcile", repo = %id))
            .await
    }

    async fn run_pass(&self, id: &RepoId) -> Action {
        let mut repo = match self.call("load repo", self.store.get_repo(id)).await {
            Ok(repo) => repo,
            Err(e) if e.is_not_found() => {
                debug!("repo no longer exists");
                return Action::Await;
            }
            Err(e) => {
                error!(error = %e, "unable to load repo");
                return Action::Await;
            }
        };

        let action = match self.sync(&mut repo).await {
            Ok(action) => action,
            Err(e) if e.is_not_found() => {
                warn!(error = %e, "object vanished during reconcile");
                Action::Await
            }
            Err(e) => {
                error!(error = %e, "reconcile aborted");
                Action::Await
            }
        };

        self.persist_status(&repo).await;
        action
    }

    /// Stages 2 to 8
    async fn sync(&self, repo: &mut Repo) -> Result<Action, ReconcileError> {
        self.ensure_git_binding(repo).await?;

        let source = repo.spec.source_repo()?;
        let commit = self
            .call(
                "resolve branch",
                self.scm.resolve_branch(&source, &repo.spec.branch),
            )
            .await?;
        let sha = short_sha(&commit).to_string();

        let config = self.fetch_config(&source, &commit).await?;
        debug!(?config, "incoming config");

        self.ensure_pipeline(repo, &config).await?;

        if repo.status.commit_sha.as_deref() != Some(sha.as_str()) {
            info!(
                branch = %repo.spec.branch,
                old = repo.status.commit_sha.as_deref().unwrap_or("<none>"),
                new = %sha,
                "new commit detected"
            );
            self.trigger_run(repo, &commit, config).await?;
        }

        self.poll_runs(repo).await?;

        if repo.status.runs.has_incomplete() {
            info!("waiting for runs to finish");
            return Ok(Action::Requeue(self.settings.requeue_after));
        }

        Ok(Action::Await)
    }

    async fn ensure_git_binding(&self, repo: &mut Repo) -> Result<(), ReconcileError> {
        let lookup = self
            .call(
                "get git binding",
                self.engine.get_git_binding(repo.namespace(), repo.name()),
            )
            .await;

        let binding = match lookup {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => {
                let binding = GitBinding::for_repo(repo);
                self.call(
                    "create git binding",
                    self.engine.create_git_binding(&binding),
                )
                .await?;
                info!(binding = %binding.name, "created git binding");
                binding
            }
            Err(e) => return Err(e),
        };

        repo.status.engine_ref = Some(binding.object_ref());
        Ok(())
    }

    async fn fetch_config(
        &self,
        source: &SourceRepo,
        commit: &str,
    ) -> Result<PipelineConfig, ReconcileError> {
        let encoded = self
            .call(
                "fetch manifest",
                self.scm
                    .get_file_content(source, &self.settings.manifest_path, commit),
            )
            .await?;

        Ok(PipelineConfig::from_base64(&encoded)?)
    }

    /// Creates the pipeline definition, or overwrites it with the freshly
    /// generated plan
    async fn ensure_pipeline(
        &self,
        repo: &Repo,
        config: &PipelineConfig,
    ) -> Result<(), ReconcileError> {
        let definition = PipelineDefinition::for_repo(repo, generate(config));

        let existing = self
            .call(
                "get pipeline",
                self.engine.get_pipeline(repo.namespace(), repo.name()),
            )
            .await;

        match existing {
            Ok(_) => {
                self.call("update pipeline", self.engine.update_pipeline(&definition))
                    .await
            }
            Err(e) if e.is_not_found() => {
                self.call("create pipeline", self.engine.create_pipeline(&definition))
                    .await?;
                info!(tasks = definition.spec.tasks.len(), "created pipeline");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Pins the binding to `commit`, starts a run and records it
    ///
    /// Status only advances once the run exists, so a failure here is
    /// retried by the next pass.
    async fn trigger_run(
        &self,
        repo: &mut Repo,
        commit: &str,
        config: PipelineConfig,
    ) -> Result<(), ReconcileError> {
        let sha = short_sha(commit).to_string();

        let patch = PatchBinding::revision(&repo.spec.url, commit);
        self.call(
            "pin git binding",
            self.engine
                .patch_git_binding(repo.namespace(), repo.name(), &patch),
        )
        .await?;

        let run = self
            .call(
                "create run",
                self.engine.create_run(&CreateRun::for_repo(repo, &sha)),
            )
            .await?;
        info!(run = %run.name, commit = %sha, "triggered run");

        repo.status
            .runs
            .record(RunRecord::started(run.object_ref(), &sha));
        repo.status.commit_sha = Some(sha);
        repo.status.config = Some(config);

        Ok(())
    }

    async fn poll_runs(&self, repo: &mut Repo) -> Result<(), ReconcileError> {
        for record in repo.status.runs.incomplete_mut() {
            let name = record.run_ref.name.clone();
            let lookup = self
                .call(
                    "get run status",
                    self.engine.get_run(&record.run_ref.namespace, &name),
                )
                .await;

            match lookup {
                Ok(run) => {
                    record.observe(&run.conditions);
                    if record.completed && record.succeeded {
                        info!(run = %name, commit = %record.commit_sha, "run succeeded");
                    } else if record.completed {
                        warn!(run = %name, status = %record.status, "run failed");
                    } else {
                        debug!(run = %name, status = %record.status, "run in progress");
                    }
                }
                Err(e) if e.is_not_found() => {
                    warn!(run = %name, "run no longer exists in the engine");
                    record.mark_missing();
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    async fn persist_status(&self, repo: &Repo) {
        let id = repo.id();
        match self
            .call("patch status", self.store.patch_status(&id, &repo.status))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("repo deleted before status was saved"),
            Err(e) => error!(error = %e, "error patching status"),
        }
    }

    /// Awaits a collaborator call under the call timeout
    async fn call<T>(
        &self,
        context: &'static str,
        fut: impl Future<Output = tundra_client::Result<T>>,
    ) -> Result<T, ReconcileError> {
        match tokio::time::timeout(self.settings.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(ReconcileError::Collaborator { context, source }),
            Err(_) => Err(ReconcileError::Timeout { context }),
        }
    }
}
