//! Run history ledger
//!
//! Bounded, newest-first list of the runs triggered for a repo. Entries are
//! only ever removed by age when a new run is recorded into a full ledger.

use serde::{Deserialize, Serialize};

use crate::domain::run::RunRecord;

/// Maximum number of runs kept in a repo's status
pub const MAX_RUN_HISTORY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RunRecord>", into = "Vec<RunRecord>")]
pub struct RunHistory(Vec<RunRecord>);

impl RunHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a new run at the front of the ledger
    ///
    /// Existing entries are cut down to `MAX_RUN_HISTORY - 1` first, so the
    /// ledger never holds more than [`MAX_RUN_HISTORY`] runs.
    pub fn record(&mut self, run: RunRecord) {
        self.0.truncate(MAX_RUN_HISTORY - 1);
        self.0.insert(0, run);
    }

    /// Most recently triggered run
    pub fn latest(&self) -> Option<&RunRecord> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_incomplete(&self) -> bool {
        self.0.iter().any(|run| !run.completed)
    }

    /// Runs still waiting on an outcome, newest first
    pub fn incomplete_mut(&mut self) -> impl Iterator<Item = &mut RunRecord> {
        self.0.iter_mut().filter(|run| !run.completed)
    }
}

impl From<Vec<RunRecord>> for RunHistory {
    /// Builds a ledger from stored records, keeping at most the newest
    /// [`MAX_RUN_HISTORY`]
    fn from(mut runs: Vec<RunRecord>) -> Self {
        runs.truncate(MAX_RUN_HISTORY);
        Self(runs)
    }
}

impl From<RunHistory> for Vec<RunRecord> {
    fn from(history: RunHistory) -> Self {
        history.0
    }
}

impl<'a> IntoIterator for &'a RunHistory {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
