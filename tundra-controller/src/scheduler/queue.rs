//! Deduplicating work queue
//!
//! An id sits in the queue at most once. While an id is being processed it
//! is never handed out again; adds that arrive in the meantime are parked
//! and the id goes back on the queue when [`WorkQueue::done`] is called.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tundra_core::domain::repo::RepoId;

#[derive(Default)]
struct QueueState {
    queue: VecDeque<RepoId>,
    queued: HashSet<RepoId>,
    active: HashSet<RepoId>,
    dirty: HashSet<RepoId>,
    shutdown: bool,
}

/// Queue of repos waiting for a reconciliation pass
#[derive(Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `id` unless it is already waiting
    pub fn add(&self, id: RepoId) {
        let mut state = self.state.lock().unwrap();
        if state.shutdown {
            return;
        }

        if state.active.contains(&id) {
            state.dirty.insert(id);
            return;
        }

        if state.queued.insert(id.clone()) {
            state.queue.push_back(id);
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Enqueues `id` once `delay` has passed
    pub fn add_after(self: &Arc<Self>, id: RepoId, delay: Duration) {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(id);
        });
    }

    /// Waits for the next id and marks it active
    ///
    /// Returns `None` once the queue is shut down.
    pub async fn next(&self) -> Option<RepoId> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().unwrap();
                if state.shutdown {
                    return None;
                }
                if let Some(id) = state.queue.pop_front() {
                    state.queued.remove(&id);
                    state.active.insert(id.clone());
                    return Some(id);
                }
            }
            notified.await;
        }
    }

    /// Marks processing of `id` finished, requeueing it if it was added
    /// while active
    pub fn done(&self, id: &RepoId) {
        let mut state = self.state.lock().unwrap();
        state.active.remove(id);

        if state.dirty.remove(id) && !state.shutdown && state.queued.insert(id.clone()) {
            state.queue.push_back(id.clone());
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Stops handing out ids and wakes every waiter
    pub fn shutdown(&self) {
        self.state.lock().unwrap().shutdown = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    /// Number of ids waiting to be handed out
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self, id: &RepoId) -> bool {
        self.state.lock().unwrap().active.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> RepoId {
        RepoId::new("apps", name)
    }

    #[tokio::test]
    async fn test_duplicate_adds_collapse() {
        let queue = WorkQueue::new();
        queue.add(id("web"));
        queue.add(id("web"));
        queue.add(id("api"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next().await, Some(id("web")));
        assert_eq!(queue.next().await, Some(id("api")));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_active_id_is_deferred_until_done() {
        let queue = WorkQueue::new();
        queue.add(id("web"));
        let active = queue.next().await.unwrap();

        queue.add(id("web"));
        queue.add(id("web"));
        assert!(queue.is_empty());

        queue.done(&active);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next().await, Some(id("web")));
    }

    #[tokio::test]
    async fn test_done_without_pending_add_leaves_queue_empty() {
        let queue = WorkQueue::new();
        queue.add(id("web"));
        let active = queue.next().await.unwrap();

        queue.done(&active);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_after_waits_for_delay() {
        let queue = Arc::new(WorkQueue::new());
        queue.add_after(id("web"), Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(queue.is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(queue.next().await, Some(id("web")));
    }

    #[tokio::test]
    async fn test_next_wakes_on_add() {
        let queue = Arc::new(WorkQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.next().await })
        };

        tokio::task::yield_now().await;
        queue.add(id("web"));

        assert_eq!(waiter.await.unwrap(), Some(id("web")));
    }

    #[tokio::test]
    async fn test_shutdown_releases_waiters() {
        let queue = Arc::new(WorkQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.next().await })
        };

        tokio::task::yield_now().await;
        queue.shutdown();
        queue.add(id("web"));

        assert_eq!(waiter.await.unwrap(), None);
        assert!(queue.is_empty());
    }
}
