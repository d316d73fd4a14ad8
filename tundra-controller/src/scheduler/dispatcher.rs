//! Reconcile dispatcher
//!
//! Pulls repo ids off the work queue and runs one reconciliation pass per id
//! in its own task, never more than the configured number at once.

use std::sync::Arc;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use tundra_core::domain::repo::RepoId;

use crate::reconciler::{Action, Reconciler};
use crate::scheduler::WorkQueue;

/// Runs reconciliation passes for queued repos
pub struct Dispatcher {
    queue: Arc<WorkQueue>,
    reconciler: Arc<Reconciler>,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(queue: Arc<WorkQueue>, reconciler: Arc<Reconciler>, max_concurrent: usize) -> Self {
        Self {
            queue,
            reconciler,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Dispatches until `shutdown` fires, then cancels in-flight passes
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting dispatcher (max concurrent: {})",
            self.semaphore.available_permits()
        );

        let mut tasks = JoinSet::new();

        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.changed() => break,
            };

            let id = tokio::select! {
                id = self.queue.next() => match id {
                    Some(id) => id,
                    None => break,
                },
                _ = shutdown.changed() => break,
            };

            debug!(repo = %id, queued = self.queue.len(), "dispatching");
            let queue = Arc::clone(&self.queue);
            let reconciler = Arc::clone(&self.reconciler);

            tasks.spawn(async move {
                let _permit = permit;
                let in_flight = InFlight {
                    queue: Arc::clone(&queue),
                    id: id.clone(),
                };

                let action = reconciler.reconcile(&id).await;
                drop(in_flight);

                if let Action::Requeue(delay) = action {
                    queue.add_after(id, delay);
                }
            });

            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    warn!("Reconcile task panicked: {}", e);
                }
            }
        }

        self.queue.shutdown();

        let cancelled = tasks.len();
        tasks.shutdown().await;
        info!("Dispatcher stopped ({} in-flight pass(es) cancelled)", cancelled);
    }
}

/// Releases a repo back to the queue when its pass ends, panics included
struct InFlight {
    queue: Arc<WorkQueue>,
    id: RepoId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.queue.done(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use tundra_core::domain::run::ConditionStatus;

    use super::*;
    use crate::testing::*;

    fn start(h: &Harness) -> (Arc<WorkQueue>, watch::Sender<bool>, tokio::task::JoinHandle<()>) {
        let queue = Arc::new(WorkQueue::new());
        let dispatcher = Dispatcher::new(Arc::clone(&queue), Arc::clone(&h.reconciler), 2);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { dispatcher.run(rx).await });
        (queue, tx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_requeues_until_run_finishes() {
        let h = harness(MANIFEST);
        let (queue, tx, handle) = start(&h);

        queue.add(web_id());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.engine.run_count(), 1);
        assert_eq!(h.store.patches.load(Ordering::SeqCst), 1);

        // run still going, so the requeue delay brings another pass
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.store.patches.load(Ordering::SeqCst), 2);

        let run_name = h.store.status(&web_id()).runs.latest().unwrap().run_ref.name.clone();
        h.engine.finish(&run_name, ConditionStatus::True, "Succeeded");
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.store.patches.load(Ordering::SeqCst), 3);

        // finished runs stop the requeue loop
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.store.patches.load(Ordering::SeqCst), 3);
        assert_eq!(h.engine.run_count(), 1);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_dispatch() {
        let h = harness(MANIFEST);
        let (queue, tx, handle) = start(&h);

        tx.send(true).unwrap();
        handle.await.unwrap();

        queue.add(web_id());
        assert!(queue.is_empty());
        assert_eq!(h.engine.run_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_pass() {
        let h = harness(MANIFEST);
        *h.scm.delay.lock().unwrap() = Some(Duration::from_secs(5));
        let (queue, tx, handle) = start(&h);

        queue.add(web_id());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(queue.is_active(&web_id()));

        // pass is parked in the branch lookup
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(!queue.is_active(&web_id()));
        assert_eq!(h.store.patches.load(Ordering::SeqCst), 0);
        assert!(h.store.status(&web_id()).engine_ref.is_none());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.store.patches.load(Ordering::SeqCst), 0);
        assert_eq!(h.engine.run_count(), 0);
    }
}
