//! Pipeline engine DTOs
//!
//! Objects the controller creates in the engine for each repo: a git source
//! binding, a pipeline definition holding the execution plan, and runs of
//! that pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::plan::{CLUSTER_RESOURCE, ExecutionPlan, Param, REPO_RESOURCE};
use crate::domain::repo::{ObjectRef, OwnerRef, Repo};
use crate::domain::run::Condition;

/// Git source binding the engine checks a repo out from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitBinding {
    pub name: String,
    pub namespace: String,
    pub owner: OwnerRef,
    pub params: Vec<Param>,
}

impl GitBinding {
    /// Binding for a repo that tracks the tip of its branch
    pub fn for_repo(repo: &Repo) -> Self {
        Self {
            name: repo.name().to_string(),
            namespace: repo.namespace().to_string(),
            owner: repo.owner_ref(),
            params: binding_params(&repo.spec.url, &repo.spec.branch),
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.namespace, &self.name)
    }
}

/// Replacement parameters for an existing binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchBinding {
    pub params: Vec<Param>,
}

impl PatchBinding {
    /// Pins the binding to a specific revision
    pub fn revision(url: &str, revision: &str) -> Self {
        Self {
            params: binding_params(url, revision),
        }
    }
}

fn binding_params(url: &str, revision: &str) -> Vec<Param> {
    vec![Param::new("url", url), Param::new("revision", revision)]
}

/// Pipeline definition stored in the engine, one per repo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub namespace: String,
    pub owner: OwnerRef,
    pub spec: ExecutionPlan,
}

impl PipelineDefinition {
    pub fn for_repo(repo: &Repo, spec: ExecutionPlan) -> Self {
        Self {
            name: repo.name().to_string(),
            namespace: repo.namespace().to_string(),
            owner: repo.owner_ref(),
            spec,
        }
    }
}

/// Binds one of the plan's declared resources to a concrete engine object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBinding {
    pub name: String,
    pub resource_ref: String,
}

/// Request to start a run of a repo's pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRun {
    /// Prefix the engine completes with a random suffix
    pub generate_name: String,
    pub namespace: String,
    pub owner: OwnerRef,
    pub pipeline_ref: String,
    pub resources: Vec<ResourceBinding>,
}

impl CreateRun {
    /// Run of the repo's pipeline for `short_sha`, checked out through the
    /// repo's git binding and deployed to its cluster binding
    pub fn for_repo(repo: &Repo, short_sha: &str) -> Self {
        Self {
            generate_name: format!("{}-{}-", repo.name(), short_sha),
            namespace: repo.namespace().to_string(),
            owner: repo.owner_ref(),
            pipeline_ref: repo.name().to_string(),
            resources: vec![
                ResourceBinding {
                    name: REPO_RESOURCE.to_string(),
                    resource_ref: repo.name().to_string(),
                },
                ResourceBinding {
                    name: CLUSTER_RESOURCE.to_string(),
                    resource_ref: repo.spec.cluster.clone(),
                },
            ],
        }
    }
}

/// A run as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub uid: Option<Uuid>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Run {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            uid: self.uid,
        }
    }
}
