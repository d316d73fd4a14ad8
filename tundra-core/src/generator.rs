//! Execution plan generator
//!
//! Translates a [`PipelineConfig`] into the [`ExecutionPlan`] stored in the
//! engine. The controller overwrites the stored plan on every pass, so the
//! output must depend on nothing but the input config.

use crate::domain::manifest::{PipelineConfig, Strategy};
use crate::domain::plan::{
    CLUSTER_RESOURCE, CLUSTER_TEMPLATE_KIND, DeclaredResource, ExecutionPlan, REPO_RESOURCE,
    ResourceKind, TaskInput, TaskSpec, TemplateRef,
};

/// Builds the execution plan for a manifest
///
/// One task per step, named `task-<index>`. Sequential manifests chain each
/// task after the previous one; parallel manifests add no edges.
pub fn generate(config: &PipelineConfig) -> ExecutionPlan {
    let tasks = config
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let run_after = match config.strategy {
                Strategy::Sequential if i > 0 => Some(task_name(i - 1)),
                _ => None,
            };

            TaskSpec {
                name: task_name(i),
                params: step.executor.params(&step.path),
                inputs: task_inputs(),
                template: TemplateRef {
                    name: step.executor.template_name(),
                    kind: CLUSTER_TEMPLATE_KIND.to_string(),
                },
                run_after,
            }
        })
        .collect();

    ExecutionPlan {
        resources: vec![
            DeclaredResource {
                name: REPO_RESOURCE.to_string(),
                kind: ResourceKind::Git,
            },
            DeclaredResource {
                name: CLUSTER_RESOURCE.to_string(),
                kind: ResourceKind::Cluster,
            },
        ],
        tasks,
    }
}

fn task_name(index: usize) -> String {
    format!("task-{}", index)
}

fn task_inputs() -> Vec<TaskInput> {
    [REPO_RESOURCE, CLUSTER_RESOURCE]
        .into_iter()
        .map(|name| TaskInput {
            name: name.to_string(),
            resource: name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::{ExecutorKind, ManifestStep};
    use crate::domain::plan::Param;

    fn config(steps: &[(&str, ExecutorKind)], strategy: Strategy) -> PipelineConfig {
        PipelineConfig {
            steps: steps
                .iter()
                .map(|(path, kind)| ManifestStep::new(*path, *kind))
                .collect(),
            strategy,
        }
    }

    fn expected_resources() -> Vec<DeclaredResource> {
        vec![
            DeclaredResource {
                name: "repo".to_string(),
                kind: ResourceKind::Git,
            },
            DeclaredResource {
                name: "cluster".to_string(),
                kind: ResourceKind::Cluster,
            },
        ]
    }

    #[test]
    fn test_single_kubectl_manifest() {
        let plan = generate(&config(
            &[("test.yaml", ExecutorKind::Default)],
            Strategy::Parallel,
        ));

        let expected = ExecutionPlan {
            resources: expected_resources(),
            tasks: vec![TaskSpec {
                name: "task-0".to_string(),
                params: vec![Param::new("path", "test.yaml")],
                inputs: vec![
                    TaskInput {
                        name: "repo".to_string(),
                        resource: "repo".to_string(),
                    },
                    TaskInput {
                        name: "cluster".to_string(),
                        resource: "cluster".to_string(),
                    },
                ],
                template: TemplateRef {
                    name: "tundra-kubectl-executor".to_string(),
                    kind: "ClusterTask".to_string(),
                },
                run_after: None,
            }],
        };

        assert_eq!(plan, expected);
    }

    #[test]
    fn test_helm_chart_gets_release_param() {
        let plan = generate(&config(
            &[("path/to/chart", ExecutorKind::Helm)],
            Strategy::Parallel,
        ));

        let task = &plan.tasks[0];
        assert_eq!(task.template.name, "tundra-helm-executor");
        assert_eq!(
            task.params,
            vec![
                Param::new("path", "path/to/chart"),
                Param::new("release", "chart"),
            ]
        );
    }

    #[test]
    fn test_sequential_chains_tasks_in_order() {
        let plan = generate(&config(
            &[
                ("test-0.yaml", ExecutorKind::Default),
                ("test-1.yaml", ExecutorKind::Default),
                ("test-2.yaml", ExecutorKind::Helm),
            ],
            Strategy::Sequential,
        ));

        assert_eq!(plan.tasks[0].run_after, None);
        assert_eq!(plan.tasks[1].run_after.as_deref(), Some("task-0"));
        assert_eq!(plan.tasks[2].run_after.as_deref(), Some("task-1"));
    }

    #[test]
    fn test_parallel_tasks_are_independent() {
        let steps: Vec<(String, ExecutorKind)> = (0..6)
            .map(|i| (format!("svc-{}/deploy.yaml", i), ExecutorKind::Default))
            .collect();
        let refs: Vec<(&str, ExecutorKind)> =
            steps.iter().map(|(p, k)| (p.as_str(), *k)).collect();

        let plan = generate(&config(&refs, Strategy::Parallel));

        assert_eq!(plan.tasks.len(), 6);
        for (i, task) in plan.tasks.iter().enumerate() {
            assert_eq!(task.name, format!("task-{}", i));
            assert!(task.run_after.is_none());
            assert_eq!(task.params[0], Param::new("path", steps[i].0.clone()));
            assert_eq!(task.inputs.len(), 2);
        }
    }

    #[test]
    fn test_empty_manifest_still_declares_resources() {
        let plan = generate(&PipelineConfig::default());

        assert!(plan.tasks.is_empty());
        assert_eq!(plan.resources, expected_resources());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let cfg = config(
            &[
                ("a", ExecutorKind::Helm),
                ("b/c", ExecutorKind::Default),
            ],
            Strategy::Sequential,
        );

        let first = serde_json::to_string(&generate(&cfg)).unwrap();
        let second = serde_json::to_string(&generate(&cfg)).unwrap();
        assert_eq!(first, second);
    }
}
