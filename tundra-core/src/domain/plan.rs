//! Execution plan types
//!
//! An execution plan is the engine-facing task graph derived from a manifest.
//! It is the body of the pipeline definition stored in the engine and is
//! rebuilt on every reconciliation pass.

use serde::{Deserialize, Serialize};

/// Name of the declared source-repository resource
pub const REPO_RESOURCE: &str = "repo";

/// Name of the declared cluster-target resource
pub const CLUSTER_RESOURCE: &str = "cluster";

/// Kind of template every task references
pub const CLUSTER_TEMPLATE_KIND: &str = "ClusterTask";

/// Task graph plus the resources its tasks consume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub resources: Vec<DeclaredResource>,
    pub tasks: Vec<TaskSpec>,
}

/// External resource the plan expects to be bound at run time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredResource {
    pub name: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Git,
    Cluster,
}

/// A single task in the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub name: String,
    pub params: Vec<Param>,
    pub inputs: Vec<TaskInput>,
    pub template: TemplateRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_after: Option<String>,
}

/// Ordered name/value parameter handed to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Binds a task input to one of the plan's declared resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub resource: String,
}

/// Reference to the template that executes a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    pub kind: String,
}
