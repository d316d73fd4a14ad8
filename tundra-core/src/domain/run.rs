//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::repo::ObjectRef;

/// Condition type whose state is the aggregate outcome of a run
pub const CONDITION_SUCCEEDED: &str = "Succeeded";

/// Status recorded when the engine no longer knows about a run
pub const STATUS_RUN_NOT_FOUND: &str = "RunNotFound";

/// Status recorded for a run the engine has not reported on yet
pub const STATUS_PENDING: &str = "Pending";

/// One condition reported by the engine for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Outcome of one triggered run, as kept in the repo's run history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_ref: ObjectRef,
    /// Short SHA the run was triggered for
    pub commit_sha: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub completed: bool,
    pub triggered_at: DateTime<Utc>,
}

impl RunRecord {
    /// Creates the record for a run that was just created
    pub fn started(run_ref: ObjectRef, commit_sha: impl Into<String>) -> Self {
        Self {
            run_ref,
            commit_sha: commit_sha.into(),
            status: STATUS_PENDING.to_string(),
            succeeded: false,
            completed: false,
            triggered_at: Utc::now(),
        }
    }

    /// Applies the engine's current conditions to this record
    ///
    /// Only the `Succeeded` condition is consulted. `True` and `False` are
    /// terminal; `Unknown` means the run is still going. Completed records
    /// are never touched again.
    pub fn observe(&mut self, conditions: &[Condition]) {
        if self.completed {
            return;
        }

        let Some(condition) = conditions
            .iter()
            .find(|c| c.condition_type == CONDITION_SUCCEEDED)
        else {
            return;
        };

        self.status = if condition.reason.is_empty() {
            format!("{:?}", condition.status)
        } else {
            condition.reason.clone()
        };
        self.succeeded = condition.is_true();
        self.completed = matches!(
            condition.status,
            ConditionStatus::True | ConditionStatus::False
        );
    }

    /// Marks a run the engine has lost track of as failed
    pub fn mark_missing(&mut self) {
        if self.completed {
            return;
        }
        self.status = STATUS_RUN_NOT_FOUND.to_string();
        self.succeeded = false;
        self.completed = true;
    }
}
