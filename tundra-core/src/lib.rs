//! Tundra Core
//!
//! Core types and pure logic for the Tundra repository controller.
//!
//! This crate contains:
//! - Domain types: manifests, execution plans, repos and runs
//! - Generator: manifest to execution plan translation
//! - History: the bounded run ledger kept in repo status
//! - DTOs: wire types exchanged with the store, source control and engine

pub mod domain;
pub mod dto;
pub mod generator;
pub mod history;

pub use generator::generate;
pub use history::{MAX_RUN_HISTORY, RunHistory};
