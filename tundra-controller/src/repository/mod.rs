//! Repository layer
//!
//! Trait seams between the reconciler and the three services it reconciles
//! against. The HTTP clients from `tundra-client` implement them for real
//! deployments; tests plug in in-memory fakes.
//!
//! Errors stay as [`tundra_client::ClientError`] so callers can tell a
//! vanished object from a failing service.

mod engine;
mod source;
mod store;

// Re-export traits
pub use engine::PipelineEngine;
pub use source::SourceControl;
pub use store::RepoStore;
