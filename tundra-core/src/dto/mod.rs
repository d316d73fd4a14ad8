//! Data Transfer Objects for collaborator communication
//!
//! Wire shapes for the three services the controller talks to: the resource
//! store, the source-control host and the pipeline engine.

pub mod engine;
pub mod scm;
pub mod store;
