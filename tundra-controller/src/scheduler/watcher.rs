//! Repo watcher
//!
//! Polls the store's repo listing and feeds the work queue. A repo is
//! enqueued when it first appears or its spec generation moves; every repo
//! is enqueued again on each resync so branch heads get re-checked.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};
use tundra_core::domain::repo::RepoId;

use crate::repository::RepoStore;
use crate::scheduler::WorkQueue;

/// Turns store listings into queue entries
pub struct Watcher {
    store: Arc<dyn RepoStore>,
    queue: Arc<WorkQueue>,
    watch_interval: Duration,
    resync_interval: Duration,
    call_timeout: Duration,
    ready: Arc<AtomicBool>,
    generations: HashMap<RepoId, u64>,
}

impl Watcher {
    pub fn new(
        store: Arc<dyn RepoStore>,
        queue: Arc<WorkQueue>,
        watch_interval: Duration,
        resync_interval: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            watch_interval,
            resync_interval,
            call_timeout,
            ready: Arc::new(AtomicBool::new(false)),
            generations: HashMap::new(),
        }
    }

    /// Flag raised after the first successful listing
    pub fn ready_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.ready)
    }

    /// Polls until `shutdown` fires
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting repo watcher (interval: {:?}, resync: {:?})",
            self.watch_interval, self.resync_interval
        );

        let mut ticker = time::interval(self.watch_interval);
        // the first listing enqueues everything anyway
        let mut last_resync = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let resync = last_resync.elapsed() >= self.resync_interval;
            if resync {
                last_resync = Instant::now();
            }

            match self.poll_once(resync).await {
                Ok(0) => debug!("No repo changes"),
                Ok(n) => debug!("Enqueued {} repo(s)", n),
                Err(e) => warn!("Error listing repos: {:#}", e),
            }
        }

        info!("Repo watcher stopped");
    }

    /// Lists repos once and enqueues the ones that need a pass
    pub async fn poll_once(&mut self, resync: bool) -> Result<usize> {
        let repos = time::timeout(self.call_timeout, self.store.list_repos())
            .await
            .context("Listing repos timed out")?
            .context("Failed to list repos")?;

        self.ready.store(true, Ordering::SeqCst);

        let mut seen = HashSet::with_capacity(repos.len());
        let mut enqueued = 0;

        for repo in repos {
            let id = repo.id();
            let generation = repo.metadata.generation;
            let changed = self.generations.insert(id.clone(), generation) != Some(generation);

            if changed || resync {
                self.queue.add(id.clone());
                enqueued += 1;
            }
            seen.insert(id);
        }

        self.generations.retain(|id, _| seen.contains(id));
        Ok(enqueued)
    }
}
