//! Scheduler layer for the controller
//!
//! The watcher turns store listings into queue entries, and the dispatcher
//! drains the queue into reconciliation passes. Together they guarantee a
//! repo is never reconciled by two passes at once.

pub mod dispatcher;
pub mod queue;
pub mod watcher;

pub use dispatcher::Dispatcher;
pub use queue::WorkQueue;
pub use watcher::Watcher;
