//! Testing infrastructure for framestack integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - [`EngineWorld`]: fluent interface for declarative engine setup over a
//!   temp-dir-backed project
//! - `assertions`: custom assertions for the invariants in spec.md §8
//! - `fixtures`: sample frame-tree / tool-call-stream builders

pub mod assertions;
pub mod fixtures;
pub mod world;

pub use world::EngineWorld;
