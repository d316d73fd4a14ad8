//! Core domain types
//!
//! These types are shared between the controller (which reconciles them) and
//! the CLI (which displays them). None of them perform I/O.

pub mod manifest;
pub mod plan;
pub mod repo;
pub mod run;
